//! Collaborator traits for storage, the auth backend and the UI shell.

mod auth;
mod store;
mod ui;

pub use auth::{AuthService, LoginData, LoginResponse, RefreshData, RefreshResponse};
pub use store::SessionStore;
pub use ui::{Navigator, Notification, Notifier};
