//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// A validated API base URL.
///
/// The URL must be absolute, have a host, and use `http` or `https`.
/// Trailing slashes are dropped so endpoint paths can be appended without
/// doubling separators.
///
/// # Example
///
/// ```
/// use assembly_core::ApiUrl;
///
/// let api = ApiUrl::new("https://api.torre-norte.co/api/v1/").unwrap();
/// assert_eq!(api.endpoint("/units"), "https://api.torre-norte.co/api/v1/units");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        if url.query().is_some() || url.fragment().is_some() {
            return Err(InvalidInputError::ApiUrl {
                value: s.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);

        Ok(Self(url))
    }

    /// Returns the full URL for an endpoint path such as `/auth/login`.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must use http or https".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for ApiUrl {
    fn default() -> Self {
        Self(Url::parse(DEFAULT_API_URL).expect("default API URL is valid"))
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_dev_server() {
        let api = ApiUrl::default();
        assert_eq!(api.endpoint("/auth/login"), "http://localhost:8000/api/v1/auth/login");
    }

    #[test]
    fn valid_https_url() {
        let api = ApiUrl::new("https://api.torre-norte.co/api/v1").unwrap();
        assert_eq!(api.host(), Some("api.torre-norte.co"));
    }

    #[test]
    fn valid_localhost_http() {
        let api = ApiUrl::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(api.endpoint("units"), "http://127.0.0.1:8000/units");
    }

    #[test]
    fn normalizes_trailing_slash() {
        let api = ApiUrl::new("https://api.torre-norte.co/api/v1/").unwrap();
        assert_eq!(
            api.endpoint("/meetings/7/polls"),
            "https://api.torre-norte.co/api/v1/meetings/7/polls"
        );
    }

    #[test]
    fn plain_http_on_private_hosts() {
        let compose = ApiUrl::new("http://backend:8000/api/v1").unwrap();
        assert_eq!(compose.endpoint("/units"), "http://backend:8000/api/v1/units");

        let lan = ApiUrl::new("http://192.168.1.20:8000/api/v1").unwrap();
        assert_eq!(lan.host(), Some("192.168.1.20"));
    }

    #[test]
    fn invalid_scheme() {
        assert!(ApiUrl::new("ftp://api.torre-norte.co/api/v1").is_err());
        assert!(ApiUrl::new("file:///srv/api").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ApiUrl::new("/api/v1").is_err());
    }

    #[test]
    fn rejects_query_string() {
        assert!(ApiUrl::new("https://api.torre-norte.co/api/v1?x=1").is_err());
    }
}
