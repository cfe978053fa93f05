//! Server state

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::app::dashboard::Dashboard;
use crate::notify::NoticeBuffer;
use crate::session::SessionGateway;

/// Server state shared across handlers
pub struct ServerState {
    /// Mutations are applied one request at a time
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub gateway: Arc<SessionGateway>,
    pub notices: Arc<NoticeBuffer>,
}

impl ServerState {
    pub fn new(
        dashboard: Arc<Mutex<Dashboard>>,
        gateway: Arc<SessionGateway>,
        notices: Arc<NoticeBuffer>,
    ) -> Self {
        Self {
            dashboard,
            gateway,
            notices,
        }
    }
}
