//! Console stand-ins for the dashboard's toast and router.

use std::sync::{Mutex, PoisonError};

use assembly_core::{Navigator, Notification, Notifier};
use tracing::debug;

use crate::output;

/// Prints notifications to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.status {
            Some(status) => output::error(&format!("[{status}] {}", notification.message)),
            None => output::error(&notification.message),
        }
    }
}

/// Tracks a virtual location; being sent to the login route prints a hint.
#[derive(Debug)]
pub struct ConsoleNavigator {
    location: Mutex<String>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self {
            location: Mutex::new("/".to_string()),
        }
    }
}

impl Default for ConsoleNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ConsoleNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, path: &str) {
        debug!(path, "navigate");
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = path.to_string();
        output::hint("Session ended. Run 'assembly auth login' to sign in again.");
    }
}
