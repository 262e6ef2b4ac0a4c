//! The authenticated session and its persisted keys.

use std::fmt;

use serde_json::Value;

use crate::tokens::{AccessToken, RefreshToken};

/// Keys under which a session is persisted.
///
/// All three are written on login and removed together when the session
/// is invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    User,
}

impl SessionKey {
    /// Every key, in the order they are written.
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::User,
    ];

    /// Storage key name.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::AccessToken => "accessToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::User => "user",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated session: token pair plus the signed-in user's record.
///
/// The user record is opaque to the client; dashboards read role and unit
/// information out of it.
#[derive(Clone)]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: Value,
}

impl Session {
    pub fn new(access_token: AccessToken, refresh_token: RefreshToken, user: Value) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn storage_key_names() {
        let names: Vec<_> = SessionKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["accessToken", "refreshToken", "user"]);
    }

    #[test]
    fn debug_redacts_tokens() {
        let session = Session::new(
            AccessToken::new("access-abc"),
            RefreshToken::new("refresh-xyz"),
            json!({"email": "owner@torre-norte.co", "role": "co_owner"}),
        );
        let debug = format!("{:?}", session);
        assert!(debug.contains("co_owner"));
        assert!(!debug.contains("access-abc"));
        assert!(!debug.contains("refresh-xyz"));
    }
}
