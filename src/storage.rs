//! Snapshot persistence: one well-known slot, overwritten on every write.
//!
//! The host browser's local storage area is modeled as a [`SnapshotStore`]
//! with exactly one slot holding the latest serialized tree. The same JSON
//! shape doubles as the import/export file format, so "save to file" and
//! "persist to storage" never diverge.

use std::{
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::{hole::NodeSnapshot, BunnyHoleError};

/// Durable home for the latest tree snapshot.
///
/// `save` overwrites the single slot; `load` returns the slot's content or
/// `None` when nothing has been saved yet. Implementations report failures
/// as [`BunnyHoleError::Persistence`]; callers treat those as best-effort
/// (the in-memory tree stays authoritative).
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &NodeSnapshot) -> Result<(), BunnyHoleError>;
    fn load(&self) -> Result<Option<NodeSnapshot>, BunnyHoleError>;
}

/// In-memory store. The default choice in tests and for hosts that bring
/// their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<NodeSnapshot>>,
}

impl SnapshotStore for MemoryStore {
    fn save(&self, snapshot: &NodeSnapshot) -> Result<(), BunnyHoleError> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<NodeSnapshot>, BunnyHoleError> {
        Ok(self.slot.lock().clone())
    }
}

/// Store backed by a single JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &NodeSnapshot) -> Result<(), BunnyHoleError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| BunnyHoleError::Persistence(err.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|err| BunnyHoleError::Persistence(format!("{}: {err}", self.path.display())))
    }

    fn load(&self) -> Result<Option<NodeSnapshot>, BunnyHoleError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(BunnyHoleError::Persistence(format!(
                    "{}: {err}",
                    self.path.display()
                )))
            }
        };
        let snapshot = serde_json::from_str(&json)
            .map_err(|err| BunnyHoleError::Persistence(err.to_string()))?;
        Ok(Some(snapshot))
    }
}

/// Writes the tree to a user-selected file as UTF-8 JSON.
pub fn export_snapshot(path: &Path, snapshot: &NodeSnapshot) -> Result<(), BunnyHoleError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads a previously exported tree back in. The caller replaces the
/// in-memory tree wholesale with the result.
pub fn import_snapshot(path: &Path) -> Result<NodeSnapshot, BunnyHoleError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
