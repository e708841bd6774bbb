//! Durable record of the bound action's metadata.
//!
//! `/init` and `/run` are guaranteed to land in the same container
//! filesystem but not necessarily in the same process, so the binding is a
//! small JSON document on disk with an explicit load/save contract rather
//! than in-memory state.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ActivationError;

fn default_entry_point() -> String {
    "main".to_string()
}

/// The action bound to this container for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAction {
    /// Fully qualified action name, as submitted. May be empty.
    #[serde(default)]
    pub name: String,
    /// Name of the global function invoked on every run.
    #[serde(rename = "main", default = "default_entry_point")]
    pub entry_point: String,
}

/// Load/save handle for the persisted [`BoundAction`].
#[derive(Debug, Clone)]
pub struct ActionStore {
    path: PathBuf,
}

impl ActionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Persist the binding, creating parent directories as needed.
    /// Overwrites any previous record.
    pub fn save(&self, action: &BoundAction) -> Result<(), ActivationError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(action)
            .map_err(|e| ActivationError::Internal(format!("serialize action config: {e}")))?;
        fs::write(&self.path, body)?;
        Ok(())
    }

    /// Read the binding back. A missing or unreadable record means `/run`
    /// arrived before a successful `/init`.
    pub fn load(&self) -> Result<BoundAction, ActivationError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ActivationError::ConfigMissing(format!(
                    "{} does not exist",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            ActivationError::ConfigMissing(format!(
                "{} is unreadable: {e}",
                self.path.display()
            ))
        })
    }
}
