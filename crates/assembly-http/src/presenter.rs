//! Turning client failures into user-visible notifications.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use assembly_core::error::AuthError;
use assembly_core::{Error, ErrorKind, Notification, Notifier};

/// Shown when nothing better is known.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Shown when the request went out but no response came back.
pub const NETWORK_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// Shown when the session could not be recovered.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Maps errors to notifications, except for failed login calls, which the
/// login form reports itself.
#[derive(Clone)]
pub struct ErrorPresenter {
    notifier: Arc<dyn Notifier>,
    login_path: String,
}

impl ErrorPresenter {
    pub fn new(notifier: Arc<dyn Notifier>, login_path: impl Into<String>) -> Self {
        Self {
            notifier,
            login_path: login_path.into(),
        }
    }

    /// Whether `path` targets the login endpoint.
    pub fn is_login_request(&self, path: &str) -> bool {
        !self.login_path.is_empty() && path.contains(&self.login_path)
    }

    /// Pick the user-facing message for `err`.
    ///
    /// Server payloads win in the order `message`, `detail`, fallback.
    /// An abandoned refresh leaves the session in place, so it is not reported
    /// as an expiry.
    pub fn message_for(err: &Error) -> String {
        if matches!(err, Error::Auth(AuthError::RefreshAbandoned)) {
            return FALLBACK_MESSAGE.to_string();
        }

        match err.kind() {
            ErrorKind::Server | ErrorKind::AuthExpired => err
                .api_error()
                .and_then(|api| api.message.clone().or_else(|| api.detail.clone()))
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            ErrorKind::AuthExhausted | ErrorKind::RefreshFailed => {
                SESSION_EXPIRED_MESSAGE.to_string()
            }
            ErrorKind::Network => NETWORK_MESSAGE.to_string(),
            ErrorKind::RequestConstruction | ErrorKind::Storage => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Notify about a failed call to `path`. Returns whether a notification
    /// was sent.
    pub fn present(&self, path: &str, err: &Error) -> bool {
        if self.is_login_request(path) {
            return false;
        }

        self.notifier.notify(Notification {
            kind: err.kind(),
            status: err.status(),
            message: Self::message_for(err),
        });
        true
    }
}

impl fmt::Debug for ErrorPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorPresenter")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// Notifier that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        warn!(
            kind = ?notification.kind,
            status = notification.status,
            "{}",
            notification.message
        );
    }
}

#[cfg(test)]
mod tests {
    use assembly_core::MemoryNotifier;
    use assembly_core::error::{ApiError, RequestError, TransportError};
    use serde_json::json;

    use super::*;

    fn presenter() -> (Arc<MemoryNotifier>, ErrorPresenter) {
        let notifier = Arc::new(MemoryNotifier::new());
        (notifier.clone(), ErrorPresenter::new(notifier, "/auth/login"))
    }

    fn api(status: u16, body: serde_json::Value) -> Error {
        ApiError::from_payload(status, Some(body)).into()
    }

    #[test]
    fn message_takes_priority_over_detail() {
        let err = api(409, json!({"message": "Unit already assigned", "detail": "unit 4B"}));
        assert_eq!(ErrorPresenter::message_for(&err), "Unit already assigned");
    }

    #[test]
    fn detail_used_when_message_missing() {
        let err = api(404, json!({"detail": "Meeting not found"}));
        assert_eq!(ErrorPresenter::message_for(&err), "Meeting not found");
    }

    #[test]
    fn fallback_when_payload_is_silent() {
        let err: Error = ApiError::new(500).into();
        assert_eq!(ErrorPresenter::message_for(&err), FALLBACK_MESSAGE);
    }

    #[test]
    fn three_failure_shapes() {
        let server = api(422, json!({"detail": "quorum must be positive"}));
        let network: Error = TransportError::Timeout { duration_ms: 30_000 }.into();
        let construction: Error = RequestError::Body {
            message: "key must be a string".into(),
        }
        .into();

        assert_eq!(ErrorPresenter::message_for(&server), "quorum must be positive");
        assert_eq!(ErrorPresenter::message_for(&network), NETWORK_MESSAGE);
        assert_eq!(ErrorPresenter::message_for(&construction), FALLBACK_MESSAGE);
    }

    #[test]
    fn session_fatal_errors_ask_for_sign_in() {
        let err: Error = AuthError::Exhausted { attempts: 3 }.into();
        assert_eq!(ErrorPresenter::message_for(&err), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn abandoned_refresh_is_not_an_expiry() {
        let (notifier, presenter) = presenter();
        let err: Error = AuthError::RefreshAbandoned.into();

        assert!(presenter.present("/units", &err));
        let notifications = notifier.notifications();
        assert_eq!(notifications[0].kind, ErrorKind::RefreshFailed);
        assert_eq!(notifications[0].message, FALLBACK_MESSAGE);
    }

    #[test]
    fn login_failures_are_not_presented() {
        let (notifier, presenter) = presenter();
        let err = api(400, json!({"detail": "invalid credentials"}));

        assert!(!presenter.present("/auth/login", &err));
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn other_failures_are_presented_once() {
        let (notifier, presenter) = presenter();
        let err = api(403, json!({"detail": "Admins only"}));

        assert!(presenter.present("/polls/9/close", &err));
        assert_eq!(
            notifier.notifications(),
            [Notification {
                kind: ErrorKind::Server,
                status: Some(403),
                message: "Admins only".into(),
            }]
        );
    }
}
