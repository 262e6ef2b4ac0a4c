//! assembly-core - Core types and traits for the assembly platform API client.
//!
//! This crate holds everything the transport and storage crates agree on:
//! the session model, redacted token types, the error taxonomy and the
//! collaborator traits (session storage, auth backend, navigation and
//! notifications).

pub mod credentials;
pub mod error;
pub mod memory;
pub mod session;
pub mod token_store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::{Error, ErrorKind};
pub use memory::{MemoryNavigator, MemoryNotifier, MemorySessionStore};
pub use session::{Session, SessionKey};
pub use token_store::TokenStore;
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{
    AuthService, LoginData, LoginResponse, Navigator, Notification, Notifier, RefreshData,
    RefreshResponse, SessionStore,
};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
