//! Error types for the assembly client.
//!
//! One error enum with explicit variants for transport, request construction,
//! authentication, API, storage and input validation failures. Errors are
//! `Clone` because a single refresh failure is handed to every caller that was
//! queued behind it.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The unified error type for assembly client operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The request was sent but no response came back.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be built, so it was never sent.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Authentication and token refresh failures.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The server answered with a non-success status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session storage failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Coarse classification of an [`Error`], used for presentation and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401 that could not be recovered for this request.
    AuthExpired,
    /// 401 after the refresh attempt ceiling was reached.
    AuthExhausted,
    /// The refresh call itself failed.
    RefreshFailed,
    /// Request sent, no response received.
    Network,
    /// Request never sent.
    RequestConstruction,
    /// Any other non-2xx response.
    Server,
    /// Session storage could not be read or written.
    Storage,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Network,
            Error::Request(_) | Error::InvalidInput(_) => ErrorKind::RequestConstruction,
            Error::Api(_) => ErrorKind::Server,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Auth(AuthError::Expired(_)) => ErrorKind::AuthExpired,
            Error::Auth(AuthError::Exhausted { .. }) => ErrorKind::AuthExhausted,
            Error::Auth(AuthError::LoginRejected { .. }) => ErrorKind::Server,
            Error::Auth(_) => ErrorKind::RefreshFailed,
        }
    }

    /// Whether this error ends the stored session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AuthExhausted | ErrorKind::RefreshFailed
        )
    }

    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) | Error::Auth(AuthError::Expired(api)) => Some(api.status),
            _ => None,
        }
    }

    /// The server payload behind this error, if there is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) | Error::Auth(AuthError::Expired(api)) => Some(api),
            Error::Auth(AuthError::RefreshFailed(inner)) => inner.api_error(),
            _ => None,
        }
    }
}

/// Failures after the request left the client.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The response arrived but its body could not be read or decoded.
    #[error("invalid response body: {message}")]
    Body { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Failures while building a request, before anything was sent.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The target URL could not be built.
    #[error("invalid URL '{url}': {reason}")]
    Url { url: String, reason: String },

    /// A header value could not be encoded.
    #[error("invalid value for header '{name}'")]
    Header { name: String },

    /// The request body could not be serialized.
    #[error("could not encode request body: {message}")]
    Body { message: String },

    /// The HTTP client rejected the request.
    #[error("could not build request: {message}")]
    Build { message: String },
}

/// Authentication and refresh errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The server rejected the access token and the request may not be retried.
    #[error("access token rejected: {0}")]
    Expired(ApiError),

    /// The refresh attempt ceiling was reached; the session was cleared.
    #[error("max refresh attempts exceeded ({attempts})")]
    Exhausted { attempts: u32 },

    /// The refresh call failed; the session was cleared.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] Box<Error>),

    /// No refresh token is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered without a usable access token.
    #[error("refresh rejected: {reason}")]
    RefreshRejected { reason: String },

    /// The login endpoint answered without a usable session.
    #[error("login rejected: {reason}")]
    LoginRejected { reason: String },

    /// The refreshing task went away before settling.
    #[error("refresh abandoned before it settled")]
    RefreshAbandoned,
}

/// An error response from the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Server-provided `message` field.
    pub message: Option<String>,
    /// Server-provided `detail` field.
    pub detail: Option<String>,
    /// The raw JSON payload, when the body was JSON.
    pub body: Option<Value>,
}

impl ApiError {
    /// Create an API error without a payload.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            message: None,
            detail: None,
            body: None,
        }
    }

    /// Build an API error from a JSON payload.
    ///
    /// `detail` may be a plain string or a list of validation errors, in
    /// which case the first entry's `msg` is used.
    pub fn from_payload(status: u16, body: Option<Value>) -> Self {
        let Some(body) = body else {
            return Self::new(status);
        };

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let detail = match body.get("detail") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Array(items)) => items
                .first()
                .and_then(|item| item.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };

        Self {
            status,
            message,
            detail,
            body: Some(body),
        }
    }

    /// Build an API error from a raw response body.
    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        Self::from_payload(status, serde_json::from_slice(bytes).ok())
    }

    /// Check if this is a 401 Unauthorized response.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        } else if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Session storage errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Reading or writing the backing storage failed.
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },

    /// The stored session could not be parsed.
    #[error("corrupt session data in '{path}': {message}")]
    Corrupt { path: String, message: String },

    /// A stored value could not be serialized.
    #[error("could not serialize '{key}': {message}")]
    Serialization { key: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_message_and_detail_are_extracted() {
        let err = ApiError::from_payload(
            400,
            Some(json!({"message": "unit not found", "detail": "no unit 42"})),
        );
        assert_eq!(err.message.as_deref(), Some("unit not found"));
        assert_eq!(err.detail.as_deref(), Some("no unit 42"));
    }

    #[test]
    fn validation_detail_list_uses_first_msg() {
        let err = ApiError::from_payload(
            422,
            Some(json!({"detail": [
                {"loc": ["body", "email"], "msg": "field required", "type": "missing"},
                {"loc": ["body", "name"], "msg": "too short", "type": "value_error"}
            ]})),
        );
        assert_eq!(err.detail.as_deref(), Some("field required"));
        assert!(err.message.is_none());
    }

    #[test]
    fn non_json_body_yields_bare_status() {
        let err = ApiError::from_bytes(502, b"<html>Bad Gateway</html>");
        assert_eq!(err, ApiError::new(502));
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        let expired = Error::from(AuthError::Expired(ApiError::new(401)));
        assert_eq!(expired.kind(), ErrorKind::AuthExpired);
        assert!(!expired.is_session_fatal());

        let exhausted = Error::from(AuthError::Exhausted { attempts: 3 });
        assert_eq!(exhausted.kind(), ErrorKind::AuthExhausted);
        assert!(exhausted.is_session_fatal());

        let network = Error::from(TransportError::Timeout { duration_ms: 30_000 });
        let refresh = Error::from(AuthError::RefreshFailed(Box::new(network.clone())));
        assert_eq!(refresh.kind(), ErrorKind::RefreshFailed);
        assert_eq!(network.kind(), ErrorKind::Network);

        let construction = Error::from(RequestError::Header {
            name: "authorization".into(),
        });
        assert_eq!(construction.kind(), ErrorKind::RequestConstruction);
        assert_eq!(Error::from(ApiError::new(500)).kind(), ErrorKind::Server);
    }

    #[test]
    fn refresh_failure_exposes_inner_payload() {
        let inner = Error::from(ApiError::from_payload(
            403,
            Some(json!({"detail": "refresh token revoked"})),
        ));
        let err = Error::from(AuthError::RefreshFailed(Box::new(inner)));
        assert_eq!(
            err.api_error().and_then(|api| api.detail.as_deref()),
            Some("refresh token revoked")
        );
        assert_eq!(err.status(), None);
    }
}
