//! Local snapshot persistence.
//!
//! One snapshot lives under a fixed name in the platform data directory
//! (overridable through `JCV_DATA_DIR`). It is read once at startup when no
//! shared state is supplied, overwritten on every debounced change, and
//! removed on explicit reset.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Environment variable overriding the snapshot directory.
pub const DATA_DIR_ENV: &str = "JCV_DATA_DIR";

const SNAPSHOT_FILE: &str = "snapshot.json";

/// The persisted editing state: raw text and display label for each side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Raw text of the original (left) document.
    pub original: String,
    /// Raw text of the modified (right) document.
    pub modified: String,
    /// Display label of the left side.
    #[serde(default)]
    pub left_label: String,
    /// Display label of the right side.
    #[serde(default)]
    pub right_label: String,
}

/// Reads and writes the single persisted snapshot.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Opens the store in the resolved data directory, creating it if
    /// needed. `JCV_DATA_DIR` wins over the platform default.
    pub fn open() -> Result<Self, StoreError> {
        if let Ok(value) = std::env::var(DATA_DIR_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Self::at(Path::new(trimmed));
            }
        }
        let dirs = ProjectDirs::from("dev", "jcv", "jcv").ok_or(StoreError::NoDataDir)?;
        Self::at(dirs.data_local_dir())
    }

    /// Opens the store in an explicit directory, creating it if needed.
    pub fn at(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self { path: dir.join(SNAPSHOT_FILE) })
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot, or `None` when nothing has been persisted.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrites the snapshot.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Removes the snapshot; a missing file is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
