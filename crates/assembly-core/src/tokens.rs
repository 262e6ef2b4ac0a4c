//! Bearer and refresh token types.

use std::fmt;

/// A short-lived access token sent as `Authorization: Bearer <token>`.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing authorization headers or persisting the session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A long-lived token exchanged for new access tokens.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing refresh requests or persisting the session.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_hides_value_in_debug() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn refresh_token_hides_value_in_debug() {
        let token = RefreshToken::new("refresh_token_value_here");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("refresh_token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn bearer_header_value() {
        assert_eq!(AccessToken::new("fresh-2").bearer(), "Bearer fresh-2");
    }
}
