//! Durable storage for the last announced identity.
//!
//! The transport manager re-announces from here after every reconnect, so a
//! restarted client rejoins its rooms without a fresh login.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notify_core::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("identity store i/o: {0}")]
    Io(#[from] io::Error),

    #[error("identity store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIdentity {
    #[serde(flatten)]
    identity: Identity,
    saved_at: DateTime<Utc>,
}

/// JSON file holding the last `(userId, role)`.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        IdentityStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved identity; `None` if nothing was saved (or it was cleared).
    pub fn load(&self) -> Result<Option<Identity>, IdentityStoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredIdentity = serde_json::from_str(&text)?;
        Ok(Some(stored.identity))
    }

    /// Replace the stored identity.
    ///
    /// Written to a sibling temp file and renamed into place, so a crash
    /// mid-write leaves the previous identity intact.
    pub fn save(&self, identity: &Identity) -> Result<(), IdentityStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredIdentity {
            identity: identity.clone(),
            saved_at: Utc::now(),
        };
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&stored)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Forget the stored identity. Missing file is fine.
    pub fn clear(&self) -> Result<(), IdentityStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
