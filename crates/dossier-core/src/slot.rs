//! The `StorageSlot` trait — the persistence seam.
//!
//! A slot holds the entire serialized [`Database`] under one name. There is
//! exactly one writer (the repository), so `save` is unconditional
//! last-writer-wins with no concurrency check.

use std::cell::RefCell;

use crate::model::Database;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the single storage slot backing a repository.
///
/// Implemented by storage backends (e.g. `dossier-store-json`); the
/// repository depends on this abstraction, not on any concrete backend.
pub trait StorageSlot {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the slot. Infallible by contract: a missing or unparsable slot
  /// yields an empty [`Database`]. Implementations log parse failures and
  /// never surface them.
  fn load(&self) -> Database;

  /// Serialize the whole database and overwrite the slot.
  fn save(&self, db: &Database) -> Result<(), Self::Error>;
}

// ─── In-memory slot ──────────────────────────────────────────────────────────

/// A slot backed by an in-memory string — useful for testing.
///
/// The database still round-trips through its serialized form on every
/// load/save, so tests exercise the same serde path as a file-backed slot.
#[derive(Debug, Default)]
pub struct MemorySlot {
  cell: RefCell<Option<String>>,
}

impl MemorySlot {
  pub fn new() -> Self { Self::default() }

  /// The raw serialized contents, if any save has happened.
  pub fn raw(&self) -> Option<String> { self.cell.borrow().clone() }

  /// Seed the slot with arbitrary contents (possibly corrupt).
  pub fn seed(&self, raw: impl Into<String>) {
    *self.cell.borrow_mut() = Some(raw.into());
  }
}

impl StorageSlot for MemorySlot {
  type Error = serde_json::Error;

  fn load(&self) -> Database {
    let Some(raw) = self.cell.borrow().clone() else {
      return Database::default();
    };
    match serde_json::from_str(&raw) {
      Ok(db) => db,
      Err(err) => {
        tracing::warn!(%err, "slot contents unparsable; starting empty");
        Database::default()
      }
    }
  }

  fn save(&self, db: &Database) -> Result<(), Self::Error> {
    let raw = serde_json::to_string(db)?;
    *self.cell.borrow_mut() = Some(raw);
    Ok(())
  }
}
