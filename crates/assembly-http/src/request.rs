//! Request descriptors.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use assembly_core::Result;
use assembly_core::error::RequestError;

/// Opt-out marker: a request carrying this header is sent without a bearer
/// token. The header itself is stripped before the request is sent.
pub const SKIP_AUTH: &str = "skip-auth";

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A request description, before interception.
///
/// Paths are relative to the configured API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    /// Set once the request has been replayed after a refresh, or when a 401
    /// must not start one.
    pub retry: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retry: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            RequestError::Header {
                name: name.to_string(),
            }
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| RequestError::Header {
            name: name.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| RequestError::Body {
            message: e.to_string(),
        })?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    /// Use url-encoded form fields as the payload.
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Mark the request to go out without a bearer token.
    #[must_use]
    pub fn skip_auth(mut self) -> Self {
        self.headers
            .insert(SKIP_AUTH, HeaderValue::from_static("true"));
        self
    }

    /// Treat a 401 on this request as final: no refresh, no replay.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.retry = true;
        self
    }

    /// Whether the request carries the [`SKIP_AUTH`] marker.
    pub fn skips_auth(&self) -> bool {
        self.headers.contains_key(SKIP_AUTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skip_auth_marker() {
        let request = ApiRequest::get("/units");
        assert!(!request.skips_auth());
        assert!(request.skip_auth().skips_auth());
    }

    #[test]
    fn skip_auth_header_is_case_insensitive() {
        let request = ApiRequest::get("/units").header("Skip-Auth", "1").unwrap();
        assert!(request.skips_auth());
    }

    #[test]
    fn invalid_header_value_is_a_construction_error() {
        let err = ApiRequest::get("/units")
            .header("x-trace", "line\nbreak")
            .unwrap_err();
        assert_eq!(err.kind(), assembly_core::ErrorKind::RequestConstruction);
    }

    #[test]
    fn json_body_is_captured() {
        let request = ApiRequest::post("/polls")
            .json(&json!({"question": "Repaint the lobby?"}))
            .unwrap();
        assert_eq!(
            request.body,
            Some(Body::Json(json!({"question": "Repaint the lobby?"})))
        );
        assert!(!request.retry);
        assert!(request.without_refresh().retry);
    }
}
