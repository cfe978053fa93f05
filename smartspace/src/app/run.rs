//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::errors::SmartSpaceError;
use crate::server::serve::serve;
use crate::session::SessionGateway;
use crate::workers::session_refresh;

/// Run the dashboard core until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SmartSpaceError> {
    info!("Initializing SmartSpace...");
    if !options.is_persistent() {
        warn!("Using the in-memory store, nothing will survive a restart");
    }

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), &options);

    let app_state = match init(&options, &shutdown_tx, &mut shutdown_manager).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start: {}", e);
            shutdown_manager.shutdown().await?;
            return Err(e);
        }
    };

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await?;
    app_state.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, SmartSpaceError> {
    let app_state = Arc::new(AppState::init(options)?);

    // Resolve the stored session before serving requests
    match app_state.gateway.get_session().await {
        Some(session) => info!("Resumed session of user {}", session.user.id),
        None => info!("No active session, sign in required"),
    }

    if options.enable_session_refresh {
        init_session_refresh_worker(
            app_state.gateway.clone(),
            options.session_refresh.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    if options.enable_server {
        init_server(
            options,
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(app_state)
}

fn init_session_refresh_worker(
    gateway: Arc<SessionGateway>,
    options: session_refresh::Options,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SmartSpaceError> {
    info!("Initializing session refresh worker...");

    let handle = tokio::spawn(async move {
        session_refresh::run(
            &options,
            gateway.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_session_refresh_handle(handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SmartSpaceError> {
    info!("Initializing local HTTP server...");

    let handle = serve(
        &options.server,
        Arc::new(app_state.server_state()),
        async move {
            let _ = shutdown_rx.recv().await;
        },
    )
    .await?;

    shutdown_manager.with_server_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: std::time::Duration,
    server_handle: Option<JoinHandle<Result<(), SmartSpaceError>>>,
    session_refresh_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, options: &AppOptions) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay: options.max_shutdown_delay,
            server_handle: None,
            session_refresh_handle: None,
        }
    }

    fn with_session_refresh_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SmartSpaceError> {
        if self.session_refresh_handle.is_some() {
            return Err(SmartSpaceError::Internal(
                "session_refresh_handle already set".to_string(),
            ));
        }
        self.session_refresh_handle = Some(handle);
        Ok(())
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), SmartSpaceError>>,
    ) -> Result<(), SmartSpaceError> {
        if self.server_handle.is_some() {
            return Err(SmartSpaceError::Internal(
                "server_handle already set".to_string(),
            ));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SmartSpaceError> {
        let _ = self.shutdown_tx.send(());

        let max_delay = self.max_shutdown_delay;
        match tokio::time::timeout(max_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Shutdown timed out after {:?}", max_delay);
                Err(SmartSpaceError::Timeout(format!("shutdown after {:?}", max_delay)))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), SmartSpaceError> {
        info!("Shutting down SmartSpace...");

        // 1. Session refresh worker
        if let Some(handle) = self.session_refresh_handle.take() {
            handle
                .await
                .map_err(|e| SmartSpaceError::Internal(e.to_string()))?;
        }

        // 2. Local server
        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| SmartSpaceError::Internal(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
