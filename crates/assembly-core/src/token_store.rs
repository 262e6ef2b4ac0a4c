//! Typed access to the persisted session.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::error::StorageError;
use crate::session::{Session, SessionKey};
use crate::tokens::{AccessToken, RefreshToken};
use crate::traits::SessionStore;

/// Typed wrapper over a [`SessionStore`].
///
/// This is the single writer of the session: login saves it, refresh updates
/// the tokens, and invalidation clears every key together.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn SessionStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn SessionStore>) -> Self {
        Self { backend }
    }

    fn read(&self, key: SessionKey) -> Result<Option<String>> {
        Ok(self.backend.get(key)?.filter(|v| !v.is_empty()))
    }

    /// The stored access token, if any.
    pub fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.read(SessionKey::AccessToken)?.map(AccessToken::new))
    }

    /// The stored refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.read(SessionKey::RefreshToken)?.map(RefreshToken::new))
    }

    /// The stored user record, if any.
    pub fn user(&self) -> Result<Option<Value>> {
        let Some(raw) = self.read(SessionKey::User)? else {
            return Ok(None);
        };
        let user = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: SessionKey::User.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(user))
    }

    /// The full session, when both tokens are stored.
    pub fn session(&self) -> Result<Option<Session>> {
        let (Some(access_token), Some(refresh_token)) =
            (self.access_token()?, self.refresh_token()?)
        else {
            return Ok(None);
        };
        let user = self.user()?.unwrap_or(Value::Null);
        Ok(Some(Session::new(access_token, refresh_token, user)))
    }

    /// Persist a freshly created session.
    pub fn save(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user).map_err(|e| {
            StorageError::Serialization {
                key: SessionKey::User.to_string(),
                message: e.to_string(),
            }
        })?;

        self.backend
            .set(SessionKey::AccessToken, session.access_token.as_str())?;
        self.backend
            .set(SessionKey::RefreshToken, session.refresh_token.as_str())?;
        self.backend.set(SessionKey::User, &user)?;

        debug!("Session saved");
        Ok(())
    }

    /// Store tokens obtained from a refresh.
    pub fn update_tokens(
        &self,
        access_token: &AccessToken,
        refresh_token: Option<&RefreshToken>,
    ) -> Result<()> {
        self.backend
            .set(SessionKey::AccessToken, access_token.as_str())?;
        if let Some(refresh_token) = refresh_token {
            self.backend
                .set(SessionKey::RefreshToken, refresh_token.as_str())?;
        }
        Ok(())
    }

    /// Remove every session key.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()?;
        debug!("Session cleared");
        Ok(())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
