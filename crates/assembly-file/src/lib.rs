//! assembly-file - File-backed session storage.
//!
//! [`FileSessionStore`] keeps the session keys in one JSON file so that a
//! login survives between runs of the CLI.

mod store;

pub use store::{FileSessionStore, SESSION_FILE_NAME};
