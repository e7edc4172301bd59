/// `tracing` subscriber bootstrap for binaries.
pub mod tracing_init;
/// Operator-facing notifications (success and failure banners).
pub mod notifier;

pub use notifier::*;
pub use tracing_init::*;
