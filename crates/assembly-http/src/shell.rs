//! Hooks into the application hosting the clients.

use std::fmt;
use std::sync::Arc;

use assembly_core::{MemoryNavigator, Navigator, Notifier};

use crate::presenter::TracingNotifier;

/// Navigation and notification sinks supplied by the host.
#[derive(Clone)]
pub struct Shell {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Shell {
    pub fn new(navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            navigator,
            notifier,
        }
    }

    /// No UI: navigation is tracked in memory and notifications are logged.
    pub fn headless() -> Self {
        Self::new(Arc::new(MemoryNavigator::default()), Arc::new(TracingNotifier))
    }

    /// Send the user to `login_route` unless they are already there.
    pub(crate) fn redirect_to_login(&self, login_route: &str) -> bool {
        if self.navigator.current_location().contains(login_route) {
            return false;
        }
        self.navigator.navigate(login_route);
        true
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assembly_core::MemoryNotifier;

    use super::*;

    #[test]
    fn redirect_skipped_when_already_on_login() {
        let navigator = Arc::new(MemoryNavigator::new("/login?next=/units"));
        let shell = Shell::new(navigator.clone(), Arc::new(MemoryNotifier::new()));

        assert!(!shell.redirect_to_login("/login"));
        assert!(navigator.history().is_empty());
    }

    #[test]
    fn redirect_happens_once() {
        let navigator = Arc::new(MemoryNavigator::new("/dashboard/polls"));
        let shell = Shell::new(navigator.clone(), Arc::new(MemoryNotifier::new()));

        assert!(shell.redirect_to_login("/login"));
        assert!(!shell.redirect_to_login("/login"));
        assert_eq!(navigator.history(), ["/login"]);
    }
}
