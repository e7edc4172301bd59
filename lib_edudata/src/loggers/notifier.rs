//! # Operator Notifications
//!
//! Resource controllers report the outcome of every load, save and delete to the
//! operator exactly once. This is separate from the diagnostic `tracing` log: it is
//! what the person at the console sees.

use colored::*;
use std::io::Write;

/// Severity of an operator notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// Sink for operator-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn failure(&self, message: &str) {
        self.notify(NoticeLevel::Failure, message);
    }
}

/// Prints notifications to the terminal, colored by level.
///
/// Successes go to stdout in green, failures to stderr in red.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    /// Disables ANSI colors (e.g. when output is piped).
    pub plain: bool,
}

impl ConsoleNotifier {
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }

    fn render(&self, level: NoticeLevel, message: &str) -> String {
        if self.plain {
            return message.to_string();
        }
        match level {
            NoticeLevel::Success => message.bright_green().to_string(),
            NoticeLevel::Failure => message.bright_red().to_string(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let line = self.render(level, message);
        // Notifications are best effort; a closed pipe must not abort the operation.
        let _ = match level {
            NoticeLevel::Success => writeln!(std::io::stdout(), "{}", line),
            NoticeLevel::Failure => writeln!(std::io::stderr(), "{}", line),
        };
    }
}
