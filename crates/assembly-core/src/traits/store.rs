//! Key-value session storage.

use crate::Result;
use crate::session::SessionKey;

/// Persistent key-value storage for the session.
///
/// Mirrors the browser storage the dashboards use: string values under a
/// fixed set of keys. Implementations must be safe to share between clients.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: SessionKey) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: SessionKey, value: &str) -> Result<()>;

    /// Remove a single value. Removing a missing key is not an error.
    fn remove(&self, key: SessionKey) -> Result<()>;

    /// Remove every session key together.
    fn clear(&self) -> Result<()> {
        for key in SessionKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}
