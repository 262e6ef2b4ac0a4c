//! Auth endpoint paths and request bodies.

use serde::Serialize;

/// Form-encoded login.
pub const AUTH_LOGIN: &str = "/auth/login";

/// Refresh token exchange.
pub const AUTH_REFRESH: &str = "/auth/refresh";

/// Server-side session revocation.
pub const AUTH_LOGOUT: &str = "/auth/logout";

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Request body for the logout endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LogoutRequest<'a> {
    pub refresh_token: &'a str,
}
