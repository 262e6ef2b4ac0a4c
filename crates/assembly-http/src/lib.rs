//! assembly-http - HTTP clients for the assembly platform API.
//!
//! Three clients share one transport layer:
//!
//! - [`AuthenticatedClient`] injects the stored bearer token and recovers
//!   from a 401 by refreshing the session once (single-flight) and replaying
//!   the request.
//! - [`PublicClient`] talks to unauthenticated endpoints and never refreshes.
//! - [`FormClient`] submits url-encoded forms (login).
//!
//! [`SessionManager`] wires them together with [`HttpAuthService`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use assembly_core::{Credentials, MemorySessionStore};
//! use assembly_http::{ClientConfig, SessionManager, Shell};
//!
//! # async fn example() -> Result<(), assembly_core::Error> {
//! let manager = SessionManager::new(
//!     ClientConfig::from_env()?,
//!     Arc::new(MemorySessionStore::new()),
//!     Shell::headless(),
//! )?;
//!
//! manager
//!     .login(&Credentials::new("admin@torre-norte.co", "hunter2"))
//!     .await?;
//!
//! let units: serde_json::Value = manager.client().get("/units").await?;
//! println!("{units}");
//! # Ok(())
//! # }
//! ```

mod auth;
mod authenticated;
mod config;
mod coordinator;
mod endpoints;
mod presenter;
mod public;
mod request;
mod shell;
mod transport;

pub use auth::{HttpAuthService, SessionManager};
pub use authenticated::AuthenticatedClient;
pub use config::ClientConfig;
pub use coordinator::{
    Acquire, DEFAULT_MAX_REFRESH_ATTEMPTS, PendingRefresh, RefreshCoordinator, RefreshGuard,
    RefreshOutcome, RefreshState, RequestQueue,
};
pub use endpoints::{AUTH_LOGIN, AUTH_LOGOUT, AUTH_REFRESH};
pub use presenter::{
    ErrorPresenter, FALLBACK_MESSAGE, NETWORK_MESSAGE, SESSION_EXPIRED_MESSAGE, TracingNotifier,
};
pub use public::{FormClient, PublicClient};
pub use request::{ApiRequest, Body, SKIP_AUTH};
pub use shell::Shell;

pub use assembly_core::{Error, Result};
