use std::sync::Mutex;

use tracing::info;

/// Decides what happens after the server rejected the session with `401`.
///
/// Called once per rejected response, after the credential was evicted and
/// regardless of whether the caller handles the resulting error.
pub trait SessionExpiredHandler: Send + Sync {
    fn on_session_expired(&self, login_route: &str);
}

/// Ignores expiry; the caller only sees the authentication error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRedirect;

impl SessionExpiredHandler for NoRedirect {
    fn on_session_expired(&self, _login_route: &str) {}
}

/// Records every redirect to the login route so a front end can act on it.
#[derive(Debug, Default)]
pub struct LoginRedirect {
    targets: Mutex<Vec<String>>,
}

impl LoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_count(&self) -> usize {
        self.targets().len()
    }

    pub fn last_target(&self) -> Option<String> {
        self.targets().last().cloned()
    }

    fn targets(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.targets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionExpiredHandler for LoginRedirect {
    fn on_session_expired(&self, login_route: &str) {
        info!(login_route, "Session expired, redirecting to login");
        self.targets().push(login_route.to_string());
    }
}
