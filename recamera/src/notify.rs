//! User notification surface

use tracing::{error, info};

/// Non-blocking toast-style notifications shown to the operator
pub trait Notifier: Send + Sync {
    /// An operation succeeded
    fn success(&self, message: &str);

    /// An operation failed
    fn error(&self, message: &str);

    /// Something the user should know about
    fn info(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!(target: "recamera::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "recamera::notify", "{}", message);
    }

    fn info(&self, message: &str) {
        info!(target: "recamera::notify", "{}", message);
    }
}
