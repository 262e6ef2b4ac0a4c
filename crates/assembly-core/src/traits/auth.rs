//! Auth backend contract.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AuthError;
use crate::session::Session;
use crate::tokens::{AccessToken, RefreshToken};
use crate::Result;

/// The backend's token refresh endpoint.
///
/// The refresh token is passed explicitly; implementations must not read it
/// from storage themselves.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshResponse>;
}

/// Envelope returned by the refresh endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<RefreshData>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of a successful refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshData {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Present when the server rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    /// A successful response carrying `access_token`.
    pub fn success(access_token: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(RefreshData {
                access_token: Some(access_token.into()),
                refresh_token: None,
            }),
            message: None,
        }
    }

    /// Extract the new token pair.
    ///
    /// Anything other than `{ success: true, data: { access_token } }` is an
    /// error.
    pub fn into_tokens(self) -> Result<(AccessToken, Option<RefreshToken>)> {
        if !self.success {
            let reason = self
                .message
                .unwrap_or_else(|| "server reported failure".to_string());
            return Err(AuthError::RefreshRejected { reason }.into());
        }

        let data = self.data.ok_or_else(|| AuthError::RefreshRejected {
            reason: "response has no data".to_string(),
        })?;

        let access_token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::RefreshRejected {
                reason: "response has no access_token".to_string(),
            })?;

        Ok((
            AccessToken::new(access_token),
            data.refresh_token.filter(|t| !t.is_empty()).map(RefreshToken::new),
        ))
    }
}

/// Envelope returned by the login endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<LoginData>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Value,
}

impl LoginResponse {
    /// Turn the response into a session.
    pub fn into_session(self) -> Result<Session> {
        if !self.success {
            let reason = self
                .message
                .unwrap_or_else(|| "server reported failure".to_string());
            return Err(AuthError::LoginRejected { reason }.into());
        }

        let data = self.data.ok_or_else(|| AuthError::LoginRejected {
            reason: "login response has no data".to_string(),
        })?;

        Ok(Session::new(
            AccessToken::new(data.access_token),
            RefreshToken::new(data.refresh_token),
            data.user,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use serde_json::json;

    fn parse(value: Value) -> RefreshResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn refresh_success_yields_access_token() {
        let (access, refresh) = parse(json!({
            "success": true,
            "data": {"access_token": "fresh-2"}
        }))
        .into_tokens()
        .unwrap();
        assert_eq!(access.as_str(), "fresh-2");
        assert!(refresh.is_none());
    }

    #[test]
    fn refresh_rotation_is_picked_up() {
        let (_, refresh) = parse(json!({
            "success": true,
            "data": {"access_token": "fresh-2", "refresh_token": "rotated-r2"}
        }))
        .into_tokens()
        .unwrap();
        assert_eq!(refresh.unwrap().as_str(), "rotated-r2");
    }

    #[test]
    fn refresh_failure_shapes_are_errors() {
        for body in [
            json!({"success": false, "message": "token revoked"}),
            json!({"success": true}),
            json!({"success": true, "data": {}}),
            json!({"success": true, "data": {"access_token": ""}}),
            json!({"access_token": "looks-right-but-no-envelope"}),
        ] {
            let err = parse(body).into_tokens().unwrap_err();
            assert!(matches!(
                err,
                Error::Auth(AuthError::RefreshRejected { .. })
            ));
            assert_eq!(err.kind(), ErrorKind::RefreshFailed);
        }
    }

    #[test]
    fn login_envelope_becomes_session() {
        let response: LoginResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "access_token": "a1",
                "refresh_token": "r1",
                "user": {"id": 12, "role": "admin"}
            }
        }))
        .unwrap();
        let session = response.into_session().unwrap();
        assert_eq!(session.access_token.as_str(), "a1");
        assert_eq!(session.refresh_token.as_str(), "r1");
        assert_eq!(session.user["role"], "admin");
    }
}
