use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one event per line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global `tracing` subscriber.
///
/// The filter is read from `RUST_LOG` and falls back to `default_directive`
/// (e.g. `"info"` or `"lib_edudata=debug"`). Calling this twice is harmless: the
/// second installation attempt is ignored and `false` is returned.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Pretty => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}
