//! Login credentials type.

use std::fmt;

/// Username and password submitted to the login endpoint.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use assembly_core::Credentials;
///
/// let creds = Credentials::new("admin@torre-norte.co", "hunter2");
/// assert_eq!(creds.username(), "admin@torre-norte.co");
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username (usually an email address).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the login form. Never log it.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
