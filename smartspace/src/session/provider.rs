//! Identity provider abstraction

use async_trait::async_trait;

use crate::errors::SmartSpaceError;
use crate::models::{Session, User};

/// The external authentication service.
///
/// Implemented over HTTP by [`crate::session::client::AuthClient`]; tests
/// provide in-process fakes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SmartSpaceError>;

    /// Register an account. `None` when the provider requires email
    /// confirmation before issuing a session.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<Option<Session>, SmartSpaceError>;

    /// Revoke the session
    async fn sign_out(&self, session: &Session) -> Result<(), SmartSpaceError>;

    /// Send password recovery instructions
    async fn reset_password_for_email(&self, email: &str) -> Result<(), SmartSpaceError>;

    /// Exchange the refresh token for a new session
    async fn refresh_session(&self, session: &Session) -> Result<Session, SmartSpaceError>;

    /// The user the session belongs to; `None` when the provider rejects
    /// the access token
    async fn get_user(&self, session: &Session) -> Result<Option<User>, SmartSpaceError>;
}
