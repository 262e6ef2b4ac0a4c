//! Wiring shared by all commands.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use assembly_core::ApiUrl;
use assembly_file::FileSessionStore;
use assembly_http::{ClientConfig, SessionManager, Shell};

use crate::cli::GlobalArgs;
use crate::ui::{ConsoleNavigator, ConsoleNotifier};

/// Session store and clients for one invocation.
pub struct Context {
    pub store: FileSessionStore,
    pub manager: SessionManager,
}

impl Context {
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let mut config = ClientConfig::from_env().context("Invalid ASSEMBLY_* environment")?;
        if let Some(url) = &args.api_url {
            config = config.with_api_url(ApiUrl::new(url).context("Invalid API URL")?);
        }

        let store = match &args.session_file {
            Some(path) => FileSessionStore::new(path),
            None => FileSessionStore::open_default().context("Could not locate session file")?,
        };

        let shell = Shell::new(Arc::new(ConsoleNavigator::new()), Arc::new(ConsoleNotifier));
        let manager = SessionManager::new(config, Arc::new(store.clone()), shell)
            .context("Failed to build HTTP client")?;

        Ok(Self { store, manager })
    }
}
