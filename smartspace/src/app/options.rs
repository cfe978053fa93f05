//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::storage::settings::{
    IdentitySettings, ServerSettings, Settings, StorageBackend, StorageSettings,
};
use crate::workers::session_refresh;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Storage layout paths
    pub layout: StorageLayout,

    /// Persistence configuration
    pub storage: StorageSettings,

    /// Identity provider configuration
    pub identity: IdentitySettings,

    /// Enable local HTTP server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Enable session refresh worker
    pub enable_session_refresh: bool,

    /// Session refresh worker options
    pub session_refresh: session_refresh::Options,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl AppOptions {
    /// Options for `layout` from its loaded settings
    pub fn new(layout: StorageLayout, settings: Settings) -> Self {
        Self {
            layout,
            storage: settings.storage,
            identity: settings.identity,
            enable_server: settings.server.enabled,
            server: ServerOptions::from(&settings.server),
            enable_session_refresh: settings.session_refresh.enabled,
            session_refresh: session_refresh::Options::from(&settings.session_refresh),
            max_shutdown_delay: Duration::from_secs(30),
        }
    }

    /// Whether the store lives on disk
    pub fn is_persistent(&self) -> bool {
        self.storage.backend == StorageBackend::File
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::new(StorageLayout::default(), Settings::default())
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerOptions {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}
