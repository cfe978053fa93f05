//! Authenticated session models

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    /// Free-form profile data given at sign up (e.g., display name)
    #[serde(default)]
    pub user_metadata: serde_json::Value,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Display name from the metadata, falling back to the email
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .or(self.email.as_deref())
    }
}

/// A session issued by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    #[serde(serialize_with = "expose", deserialize_with = "conceal")]
    pub access_token: SecretString,

    #[serde(serialize_with = "expose", deserialize_with = "conceal")]
    pub refresh_token: SecretString,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime in seconds at issue time
    pub expires_in: i64,

    /// Expiration as Unix epoch seconds
    #[serde(default)]
    pub expires_at: Option<i64>,

    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

fn expose<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn conceal<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            access_token: SecretString::from(self.access_token.expose_secret().to_string()),
            refresh_token: SecretString::from(self.refresh_token.expose_secret().to_string()),
            token_type: self.token_type.clone(),
            expires_in: self.expires_in,
            expires_at: self.expires_at,
            user: self.user.clone(),
        }
    }
}

impl Session {
    /// Fill in `expires_at` from `expires_in` when the provider omitted it
    pub fn with_computed_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(Utc::now().timestamp() + self.expires_in);
        }
        self
    }

    /// Get expiration time
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// Check if the session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_within(0)
    }

    /// Check if the session expires within the given number of seconds
    pub fn expires_within(&self, seconds: i64) -> bool {
        match self.expires_at {
            Some(exp) => exp < Utc::now().timestamp() + seconds,
            None => false,
        }
    }

    /// Bearer token for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

/// What changed about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A session change, delivered to subscribers
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_out() -> Self {
        Self::new(SessionEventKind::SignedOut, None)
    }
}
