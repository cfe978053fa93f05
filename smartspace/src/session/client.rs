//! HTTP client for a GoTrue-compatible auth service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::errors::SmartSpaceError;
use crate::models::{Session, User};
use crate::session::provider::IdentityProvider;
use crate::storage::settings::IdentitySettings;

/// Auth service client
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: SecretString,
}

impl AuthClient {
    /// Create a client from the identity settings
    pub fn new(settings: &IdentitySettings) -> Result<Self, SmartSpaceError> {
        Self::with_timeout(
            &settings.url,
            settings.anon_key.expose_secret(),
            settings.request_timeout(),
        )
    }

    pub fn with_timeout(
        base_url: &str,
        anon_key: &str,
        timeout: Duration,
    ) -> Result<Self, SmartSpaceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key.to_string()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
    }

    fn authorized(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.request(method, path)
            .header(header::AUTHORIZATION, session.bearer())
    }

    async fn session_from(response: Response, what: &str) -> Result<Session, SmartSpaceError> {
        let response = check(response, what).await?;
        let session: Session = response.json().await?;
        Ok(session.with_computed_expiry())
    }
}

/// Turn a non-success response into an auth error carrying the service's
/// message
async fn check(response: Response, what: &str) -> Result<Response, SmartSpaceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("Identity request '{}' failed: {} - {}", what, status, body);
    Err(SmartSpaceError::AuthError(format!(
        "{} failed ({}): {}",
        what,
        status,
        error_message(&body)
    )))
}

/// Best-effort human message from a GoTrue error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SmartSpaceError> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::session_from(response, "sign in").await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<Option<Session>, SmartSpaceError> {
        let response = self
            .request(Method::POST, "/auth/v1/signup")
            .json(&json!({ "email": email, "password": password, "data": metadata }))
            .send()
            .await?;
        let body: Value = check(response, "sign up").await?.json().await?;

        // Without auto-confirmation the service answers with the bare user
        if body.get("access_token").is_none() {
            debug!("Sign up for {} awaits email confirmation", email);
            return Ok(None);
        }
        let session: Session = serde_json::from_value(body)?;
        Ok(Some(session.with_computed_expiry()))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), SmartSpaceError> {
        let response = self
            .authorized(Method::POST, "/auth/v1/logout", session)
            .send()
            .await?;
        check(response, "sign out").await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), SmartSpaceError> {
        let response = self
            .request(Method::POST, "/auth/v1/recover")
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check(response, "password recovery").await?;
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, SmartSpaceError> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": session.refresh_token.expose_secret() }))
            .send()
            .await?;
        Self::session_from(response, "session refresh").await
    }

    async fn get_user(&self, session: &Session) -> Result<Option<User>, SmartSpaceError> {
        let response = self
            .authorized(Method::GET, "/auth/v1/user", session)
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!("Access token rejected ({})", response.status());
            return Ok(None);
        }
        let user = check(response, "get user").await?.json().await?;
        Ok(Some(user))
    }
}
