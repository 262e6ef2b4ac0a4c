//! In-memory implementations of the collaborator traits.
//!
//! Useful for tests and for embedding the client in a process that keeps its
//! session only for its own lifetime.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Result;
use crate::session::SessionKey;
use crate::traits::{Navigator, Notification, Notifier, SessionStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session storage held in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>> {
        Ok(lock(&self.values).get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        lock(&self.values).insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        lock(&self.values).remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        lock(&self.values).clear();
        Ok(())
    }
}

/// Navigator that tracks a location string and records every navigation.
#[derive(Debug)]
pub struct MemoryNavigator {
    location: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Start at `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every path navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> String {
        lock(&self.location).clone()
    }

    fn navigate(&self, path: &str) {
        *lock(&self.location) = path.to_string();
        lock(&self.history).push(path.to_string());
    }
}

/// Notifier that keeps every notification it receives.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.received).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.received).push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_round_trip_and_clear() {
        let store = MemorySessionStore::new();
        store.set(SessionKey::AccessToken, "a1").unwrap();
        store.set(SessionKey::RefreshToken, "r1").unwrap();
        assert_eq!(store.get(SessionKey::AccessToken).unwrap().as_deref(), Some("a1"));
        assert_eq!(store.len(), 2);

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.get(SessionKey::RefreshToken).unwrap().is_none());
    }

    #[test]
    fn navigator_records_history() {
        let nav = MemoryNavigator::new("/dashboard/units");
        nav.navigate("/login");
        assert_eq!(nav.current_location(), "/login");
        assert_eq!(nav.history(), ["/login"]);
    }
}
