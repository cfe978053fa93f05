//! Storage layout configuration

use std::path::PathBuf;

use crate::errors::SmartSpaceError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Environment variable overriding the default base directory
pub const HOME_ENV: &str = "SMARTSPACE_HOME";

/// Storage layout for the dashboard
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the base directory
    pub fn base(&self) -> Dir {
        Dir::new(&self.base_dir)
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        self.base().file("settings.json")
    }

    /// Get the key-value store directory
    pub fn store_dir(&self) -> Dir {
        self.base().subdir("store")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> Dir {
        self.base().subdir("logs")
    }

    /// Setup the storage layout (create directories)
    pub fn setup(&self) -> Result<(), SmartSpaceError> {
        self.store_dir().create()?;
        self.logs_dir().create()?;
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        if let Some(dir) = std::env::var_os(HOME_ENV) {
            return Self::new(dir);
        }

        let base_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".smartspace");

        Self::new(base_dir)
    }
}
