//! Settings file management

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use url::Url;

use crate::errors::SmartSpaceError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Dashboard settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to daily files in the logs directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentitySettings,

    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageSettings,

    /// Local API server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Session refresh worker configuration
    #[serde(default)]
    pub session_refresh: SessionRefreshSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            identity: IdentitySettings::default(),
            storage: StorageSettings::default(),
            server: ServerSettings::default(),
            session_refresh: SessionRefreshSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; a missing file yields the defaults
    pub fn load(file: &File) -> Result<Self, SmartSpaceError> {
        let settings = match file.read_json::<Settings>()? {
            Some(settings) => settings,
            None => {
                debug!(
                    "No settings file at {}, using defaults",
                    file.path().display()
                );
                Settings::default()
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), SmartSpaceError> {
        Url::parse(&self.identity.url).map_err(|e| {
            SmartSpaceError::ConfigError(format!(
                "identity.url '{}' is not a valid URL: {}",
                self.identity.url, e
            ))
        })?;
        if self.identity.request_timeout_secs == 0 {
            return Err(SmartSpaceError::ConfigError(
                "identity.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identity provider settings
#[derive(Debug, Deserialize)]
pub struct IdentitySettings {
    /// Base URL of the GoTrue-compatible auth service
    #[serde(default = "default_identity_url")]
    pub url: String,

    /// Public API key sent as the `apikey` header
    #[serde(default = "empty_secret", deserialize_with = "secret_from_string")]
    pub anon_key: SecretString,

    /// Upper bound for a single provider request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_identity_url() -> String {
    "http://localhost:54321".to_string()
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn default_request_timeout() -> u64 {
    10
}

impl IdentitySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            url: default_identity_url(),
            anon_key: empty_secret(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Which key-value backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON documents in the store directory
    #[default]
    File,
    /// Process memory, nothing survives a restart
    Memory,
}

/// Persistence settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Keep the session in the store so a restart resumes it
    #[serde(default = "default_true")]
    pub persist_session: bool,
}

fn default_true() -> bool {
    true
}

/// Local API server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Session refresh worker settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRefreshSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often the session expiry is checked
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Refresh when the session expires within this many seconds
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_secs: u64,
}

fn default_check_interval() -> u64 {
    60
}

fn default_refresh_threshold() -> u64 {
    300
}

impl Default for SessionRefreshSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: default_check_interval(),
            refresh_threshold_secs: default_refresh_threshold(),
        }
    }
}
