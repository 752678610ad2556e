//! File-backed credential store

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::*;
use lucid_hal::credentials::StoreError;
use lucid_hal::{CredentialStore, Credentials};

/// Keeps the credential record as a small TOML file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileStore {
    async fn load(&mut self) -> Result<Option<Credentials>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!("Reading {} failed: {}", self.path.display(), e);
                return Err(StoreError::Storage);
            }
        };
        toml::from_str(&text).map(Some).map_err(|e| {
            warn!("Stored credentials unreadable: {}", e);
            StoreError::Corrupted
        })
    }

    async fn store(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        let text = toml::to_string(credentials).map_err(|_| StoreError::Storage)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("Writing {} failed: {}", self.path.display(), e);
            StoreError::Storage
        })?;
        debug!("Credentials saved to {}", self.path.display());
        Ok(())
    }

    async fn erase(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StoreError::Storage),
        }
    }
}
