//! Shared fakes for the integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use smartspace::errors::SmartSpaceError;
use smartspace::models::{Session, User};
use smartspace::notify::NoticeBuffer;
use smartspace::session::{IdentityProvider, Navigator, SessionGateway};

pub fn session(user_id: &str, expires_in: i64) -> Session {
    serde_json::from_value(serde_json::json!({
        "access_token": format!("access-{}", user_id),
        "refresh_token": format!("refresh-{}", user_id),
        "token_type": "bearer",
        "expires_in": expires_in,
        "expires_at": Utc::now().timestamp() + expires_in,
        "user": { "id": user_id, "email": format!("{}@example.com", user_id) }
    }))
    .unwrap()
}

/// Scripted identity provider
#[derive(Default)]
pub struct FakeProvider {
    /// Whether `get_user` accepts the token
    pub accept_token: Mutex<bool>,
    /// Whether calls fail with a transport-like error
    pub unavailable: Mutex<bool>,
    /// Artificial latency of `get_user` and `refresh_session`
    pub latency: Mutex<Duration>,
    pub sign_out_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn accepting() -> Arc<Self> {
        let provider = Self::default();
        *provider.accept_token.lock().unwrap() = true;
        Arc::new(provider)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_available(&self) -> Result<(), SmartSpaceError> {
        if *self.unavailable.lock().unwrap() {
            return Err(SmartSpaceError::ServerError("provider unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SmartSpaceError> {
        self.check_available()?;
        if password != "secreto" {
            return Err(SmartSpaceError::AuthError("Invalid login credentials".to_string()));
        }
        let user = email.split('@').next().unwrap_or("user");
        Ok(session(user, 3600))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _metadata: serde_json::Value,
    ) -> Result<Option<Session>, SmartSpaceError> {
        self.check_available()?;
        if email.starts_with("confirm") {
            return Ok(None);
        }
        Ok(Some(session("new-user", 3600)))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), SmartSpaceError> {
        self.check_available()?;
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<(), SmartSpaceError> {
        self.check_available()
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, SmartSpaceError> {
        self.delay().await;
        self.check_available()?;
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self::session(&session.user.id, 3600))
    }

    async fn get_user(&self, session: &Session) -> Result<Option<User>, SmartSpaceError> {
        self.delay().await;
        self.check_available()?;
        if *self.accept_token.lock().unwrap() {
            Ok(Some(session.user.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Navigator counting redirects
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct GatewayFixture {
    pub gateway: Arc<SessionGateway>,
    pub provider: Arc<FakeProvider>,
    pub navigator: Arc<RecordingNavigator>,
    pub notices: Arc<NoticeBuffer>,
}

pub fn gateway_fixture() -> GatewayFixture {
    let provider = FakeProvider::accepting();
    let navigator = Arc::new(RecordingNavigator::default());
    let notices = Arc::new(NoticeBuffer::default());
    let gateway = Arc::new(SessionGateway::new(
        provider.clone(),
        navigator.clone(),
        notices.clone(),
        Duration::from_secs(5),
    ));
    GatewayFixture {
        gateway,
        provider,
        navigator,
        notices,
    }
}
