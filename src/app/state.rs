use anyhow::{Context, Result};
use std::sync::Arc;

use crate::app::Config;
use crate::gateway::{AuthGateway, HttpAuthGateway};
use crate::session::{Session, SessionController, SessionStore};
use crate::storage::{CredentialStore, FileCredentialStore};

/// Application context, constructed once at process start and passed by
/// reference to everything that needs the session
pub struct AppContext {
    config: Config,
    controller: Arc<SessionController>,
}

impl AppContext {
    /// Wire a context from explicit collaborators
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        gateway: Arc<dyn AuthGateway>,
    ) -> Self {
        let controller = SessionController::new(SessionStore::new(), credentials, gateway)
            .with_clear_on_network_failure(config.session.clear_on_network_failure);

        Self {
            config,
            controller: Arc::new(controller),
        }
    }

    /// Wire the on-disk credential store and HTTP gateway described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let root = config.storage.root()?;
        let credentials = FileCredentialStore::new(&root, &config.storage.scope)
            .with_context(|| format!("Failed to open credential store in {}", root.display()))?;
        let gateway = HttpAuthGateway::new(&config.api.base_url, config.api.timeout())
            .context("Failed to build HTTP client")?;

        Ok(Self::new(config, Arc::new(credentials), Arc::new(gateway)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session controller; the only writer of session state
    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Read-only session store for subscribing consumers
    pub fn store(&self) -> &SessionStore {
        self.controller.store()
    }

    pub fn session(&self) -> Session {
        self.controller.session()
    }
}
