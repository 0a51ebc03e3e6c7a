//! [`JsonFileSlot`] — the file implementation of
//! [`StorageSlot`](dossier_core::slot::StorageSlot).

use std::fs;
use std::path::{Path, PathBuf};

use dossier_core::{model::Database, slot::StorageSlot};

use crate::{atomic::atomic_write, Result};

/// A storage slot backed by one JSON file.
///
/// `load` never fails: a missing file yields an empty database, and an
/// unparsable file is logged and likewise replaced by an empty database in
/// memory. The file itself is only overwritten by the next `save`.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
  path: PathBuf,
}

impl JsonFileSlot {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }
}

impl StorageSlot for JsonFileSlot {
  type Error = crate::Error;

  fn load(&self) -> Database {
    let raw = match fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Database::default();
      }
      Err(err) => {
        tracing::warn!(path = %self.path.display(), %err,
          "slot unreadable; starting empty");
        return Database::default();
      }
    };

    match serde_json::from_str(&raw) {
      Ok(db) => db,
      Err(err) => {
        tracing::warn!(path = %self.path.display(), %err,
          "slot contents unparsable; starting empty");
        Database::default()
      }
    }
  }

  fn save(&self, db: &Database) -> Result<()> {
    let raw = serde_json::to_string_pretty(db)?;
    atomic_write(&self.path, raw.as_bytes())?;
    Ok(())
  }
}
