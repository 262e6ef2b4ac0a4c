//! Client configuration.

use std::time::Duration;

use assembly_core::error::InvalidInputError;
use assembly_core::{ApiUrl, Result};

use crate::coordinator::DEFAULT_MAX_REFRESH_ATTEMPTS;
use crate::endpoints::AUTH_LOGIN;

/// Fixed request budget shared by every client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "ASSEMBLY_API_URL";
/// Environment variable overriding the request timeout, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "ASSEMBLY_TIMEOUT_MS";
/// Environment variable overriding the refresh attempt ceiling.
pub const ENV_MAX_REFRESH_ATTEMPTS: &str = "ASSEMBLY_MAX_REFRESH_ATTEMPTS";

/// Settings shared by the authenticated, public and form clients.
///
/// ```
/// use std::time::Duration;
/// use assembly_core::ApiUrl;
/// use assembly_http::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_api_url(ApiUrl::new("https://api.torre-norte.co/api/v1").unwrap())
///     .with_max_refresh_attempts(5);
/// assert_eq!(config.timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub api_url: ApiUrl,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Consecutive refresh attempts allowed before the session is dropped.
    pub max_refresh_attempts: u32,
    /// Endpoint path of the login call; failures there are never presented.
    pub login_path: String,
    /// Shell route the user is sent to when the session is lost.
    pub login_route: String,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: ApiUrl::default(),
            timeout: DEFAULT_TIMEOUT,
            max_refresh_attempts: DEFAULT_MAX_REFRESH_ATTEMPTS,
            login_path: AUTH_LOGIN.to_string(),
            login_route: "/login".to_string(),
            user_agent: concat!("assembly/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `ASSEMBLY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = non_empty_var(ENV_API_URL) {
            config.api_url = ApiUrl::new(url)?;
        }
        if let Some(ms) = non_empty_var(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(parse_number(ENV_TIMEOUT_MS, &ms)?);
        }
        if let Some(max) = non_empty_var(ENV_MAX_REFRESH_ATTEMPTS) {
            config.max_refresh_attempts = parse_number(ENV_MAX_REFRESH_ATTEMPTS, &max)?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: ApiUrl) -> Self {
        self.api_url = api_url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_refresh_attempts(mut self, max: u32) -> Self {
        self.max_refresh_attempts = max;
        self
    }

    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        InvalidInputError::Other {
            message: format!("{name} must be a non-negative integer, got '{value}'"),
        }
        .into()
    })
}
