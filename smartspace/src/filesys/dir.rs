//! Directory operations

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::SmartSpaceError;
use crate::filesys::file::File;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the directory (and parents)
    pub fn create(&self) -> Result<(), SmartSpaceError> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Get a file within this directory
    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }

    /// Get a subdirectory
    pub fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.path.join(name))
    }
}
