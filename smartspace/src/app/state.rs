//! Application state management

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::app::dashboard::Dashboard;
use crate::app::options::AppOptions;
use crate::errors::SmartSpaceError;
use crate::notify::NoticeBuffer;
use crate::server::state::ServerState;
use crate::session::{AuthClient, IdentityProvider, LogNavigator, SessionGateway};
use crate::storage::settings::StorageBackend;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, ProfileStore};

/// Main application state
pub struct AppState {
    /// Profile-scoped persistence
    pub store: ProfileStore,

    /// Active profile and its registries
    pub dashboard: Arc<Mutex<Dashboard>>,

    /// Authentication state
    pub gateway: Arc<SessionGateway>,

    /// Notices awaiting presentation
    pub notices: Arc<NoticeBuffer>,
}

impl AppState {
    /// Initialize application state against the configured identity service
    pub fn init(options: &AppOptions) -> Result<Self, SmartSpaceError> {
        let provider = Arc::new(AuthClient::new(&options.identity)?);
        Self::with_provider(options, provider)
    }

    /// Initialize application state with the given identity provider
    pub fn with_provider(
        options: &AppOptions,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, SmartSpaceError> {
        info!("Initializing application state...");

        let store = open_store(options)?;
        let notices = Arc::new(NoticeBuffer::default());
        let dashboard = Dashboard::open(store.clone(), notices.clone());

        let mut gateway = SessionGateway::new(
            provider,
            Arc::new(LogNavigator),
            notices.clone(),
            options.identity.request_timeout(),
        );
        if options.storage.persist_session {
            gateway = gateway.with_store(store.clone());
        }

        Ok(Self {
            store,
            dashboard: Arc::new(Mutex::new(dashboard)),
            gateway: Arc::new(gateway),
            notices,
        })
    }

    /// State handed to the HTTP server
    pub fn server_state(&self) -> ServerState {
        ServerState::new(
            self.dashboard.clone(),
            self.gateway.clone(),
            self.notices.clone(),
        )
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), SmartSpaceError> {
        info!("Shutting down application state...");
        self.gateway.cancel_pending_checks();
        Ok(())
    }
}

/// Open the configured key-value backend
pub fn open_store(options: &AppOptions) -> Result<ProfileStore, SmartSpaceError> {
    let backend: Arc<dyn KeyValueStore> = match options.storage.backend {
        StorageBackend::File => Arc::new(FileStore::open(options.layout.store_dir())?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(ProfileStore::new(backend))
}
