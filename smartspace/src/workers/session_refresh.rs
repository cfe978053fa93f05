//! Session refresh worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::errors::SmartSpaceError;
use crate::models::Session;
use crate::session::SessionGateway;
use crate::storage::settings::SessionRefreshSettings;

/// Session refresh worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Check interval
    pub check_interval: Duration,

    /// Refresh when the session expires within this duration
    pub refresh_threshold: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            refresh_threshold: Duration::from_secs(300),
        }
    }
}

impl From<&SessionRefreshSettings> for Options {
    fn from(settings: &SessionRefreshSettings) -> Self {
        Self {
            check_interval: Duration::from_secs(settings.check_interval_secs),
            refresh_threshold: Duration::from_secs(settings.refresh_threshold_secs),
        }
    }
}

/// What the worker needs from the session owner
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    async fn refresh(&self) -> Result<Session, SmartSpaceError>;
}

#[async_trait]
impl SessionRefresher for SessionGateway {
    fn current_session(&self) -> Option<Session> {
        SessionGateway::current_session(self)
    }

    async fn refresh(&self) -> Result<Session, SmartSpaceError> {
        SessionGateway::refresh(self).await
    }
}

/// Run the session refresh worker
pub async fn run<T, S, F>(
    options: &Options,
    refresher: &T,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    T: SessionRefresher + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Session refresh worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Session refresh worker shutting down...");
                return;
            }
            _ = sleep_fn(options.check_interval) => {}
        }

        let Some(session) = refresher.current_session() else {
            debug!("No session, nothing to refresh");
            continue;
        };

        let threshold_secs = options.refresh_threshold.as_secs() as i64;
        if !session.expires_within(threshold_secs) {
            debug!("Session still valid, expires at {:?}", session.expires_at());
            continue;
        }

        info!(
            "Session expires within {} seconds, refreshing...",
            threshold_secs
        );
        match refresher.refresh().await {
            Ok(refreshed) => {
                info!(
                    "Session refreshed, new expiration: {:?}",
                    refreshed.expires_at()
                );
            }
            Err(e) => {
                // retried on the next interval unless the refresh ended the session
                error!("Failed to refresh session: {}", e);
            }
        }
    }
}
