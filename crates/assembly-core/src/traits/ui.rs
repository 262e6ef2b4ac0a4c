//! Navigation and notification hooks into the hosting shell.

use crate::error::ErrorKind;

/// Moves the user between views.
///
/// The client only ever navigates to the login view after an unrecoverable
/// authentication failure.
pub trait Navigator: Send + Sync {
    /// Current location (path) of the shell.
    fn current_location(&self) -> String;

    /// Navigate to `path`.
    fn navigate(&self, path: &str);
}

/// A user-visible failure notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Failure classification.
    pub kind: ErrorKind,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// Human-readable message.
    pub message: String,
}

/// Fire-and-forget notification sink (a toast, a console line).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
