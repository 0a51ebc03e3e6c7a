//! [`Repository`] — the single owner of the in-memory [`Database`].
//!
//! All mutation goes through repository methods so the invariants
//! (timestamp refresh, cascade delete, write-time entry normalization,
//! save-after-every-mutation) live in one place. There is no ambient
//! singleton; callers hold the repository by value or `&mut`.
//!
//! Ordinary business no-ops — an update or delete naming an id that does
//! not exist — are not errors: they return `None`/`false` and skip the
//! save. The only error channel is the storage slot's save failure.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  model::{
    Database, Entry, Evidence, EvidencePatch, Investigation,
    InvestigationPatch, NewEntry, NewEvidence, NewInvestigation,
  },
  slot::StorageSlot,
};

// ─── Selection ───────────────────────────────────────────────────────────────

/// The UI focus state. Carried here rather than in the presentation layer
/// because delete operations must clear it atomically with the removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
  pub investigation: Option<Uuid>,
  pub evidence:      Option<Uuid>,
}

/// Wall-clock now, truncated to millisecond precision.
///
/// Timestamps persist as millisecond epochs, so the in-memory value must
/// carry no sub-millisecond component or a record would compare unequal to
/// its own persisted form.
fn now_ms() -> DateTime<Utc> {
  let now = Utc::now();
  let sub_ms = i64::from(now.timestamp_subsec_nanos() % 1_000_000);
  now - chrono::Duration::nanoseconds(sub_ms)
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// The repository: owns the database, the storage slot, and the selection.
pub struct Repository<S: StorageSlot> {
  db:        Database,
  slot:      S,
  selection: Selection,
}

impl<S: StorageSlot> Repository<S> {
  /// Load whatever the slot holds and wrap it. A missing or corrupt slot
  /// yields an empty database (the slot's contract).
  pub fn open(slot: S) -> Self {
    let db = slot.load();
    Self { db, slot, selection: Selection::default() }
  }

  pub fn db(&self) -> &Database { &self.db }

  pub fn slot(&self) -> &S { &self.slot }

  pub fn selection(&self) -> Selection { self.selection }

  pub fn get_investigation(&self, id: Uuid) -> Option<&Investigation> {
    self.db.investigations.iter().find(|i| i.id == id)
  }

  pub fn get_evidence(&self, id: Uuid) -> Option<&Evidence> {
    self.db.evidence.iter().find(|e| e.id == id)
  }

  // ── Investigations ────────────────────────────────────────────────────

  /// Create a case file: assigns the id, sets both timestamps to now,
  /// inserts at the front, persists, and selects the new record.
  pub fn create_investigation(
    &mut self,
    input: NewInvestigation,
  ) -> Result<&Investigation, S::Error> {
    let now = now_ms();
    let investigation = Investigation {
      id:          Uuid::new_v4(),
      title:       input.title,
      case_number: input.case_number,
      description: input.description,
      status:      input.status,
      tags:        input.tags,
      created_at:  now,
      updated_at:  now,
    };

    self.selection.investigation = Some(investigation.id);
    self.db.investigations.insert(0, investigation);
    self.slot.save(&self.db)?;
    Ok(&self.db.investigations[0])
  }

  /// Merge the present patch fields into the matching record and refresh
  /// `updated_at`. `id` and `created_at` are never touched. Returns `None`
  /// without saving if the id is unknown.
  pub fn update_investigation(
    &mut self,
    id: Uuid,
    patch: InvestigationPatch,
  ) -> Result<Option<&Investigation>, S::Error> {
    let Some(idx) = self.db.investigations.iter().position(|i| i.id == id)
    else {
      return Ok(None);
    };

    {
      let investigation = &mut self.db.investigations[idx];
      if let Some(title) = patch.title {
        investigation.title = title;
      }
      if let Some(case_number) = patch.case_number {
        investigation.case_number = Some(case_number);
      }
      if let Some(description) = patch.description {
        investigation.description = description;
      }
      if let Some(status) = patch.status {
        investigation.status = status;
      }
      if let Some(tags) = patch.tags {
        investigation.tags = tags;
      }
      investigation.updated_at = now_ms();
    }

    self.slot.save(&self.db)?;
    Ok(Some(&self.db.investigations[idx]))
  }

  /// Remove an investigation and, in the same transition, every evidence
  /// thread it owns. The evidence set to drop is computed first, then both
  /// removals and any selection clearing happen before the single save, so
  /// no orphaned evidence can persist.
  ///
  /// User confirmation is the caller's capability, not the repository's.
  pub fn delete_investigation(&mut self, id: Uuid) -> Result<bool, S::Error> {
    if !self.db.investigations.iter().any(|i| i.id == id) {
      return Ok(false);
    }

    let cascade: HashSet<Uuid> = self
      .db
      .evidence
      .iter()
      .filter(|e| e.investigation_id == id)
      .map(|e| e.id)
      .collect();

    self.db.investigations.retain(|i| i.id != id);
    self.db.evidence.retain(|e| !cascade.contains(&e.id));

    if self.selection.investigation == Some(id) {
      self.selection.investigation = None;
    }
    if let Some(focused) = self.selection.evidence {
      if cascade.contains(&focused) {
        self.selection.evidence = None;
      }
    }

    self.slot.save(&self.db)?;
    Ok(true)
  }

  // ── Evidence ──────────────────────────────────────────────────────────

  /// Create an evidence thread under `investigation_id` with an empty log,
  /// prepend it, persist, and focus it. The parent id is not validated;
  /// referential integrity is maintained by cascade delete alone.
  pub fn create_evidence(
    &mut self,
    investigation_id: Uuid,
    input: NewEvidence,
  ) -> Result<&Evidence, S::Error> {
    let now = now_ms();
    let evidence = Evidence {
      id: Uuid::new_v4(),
      investigation_id,
      title: input.title,
      kind: input.kind,
      summary: input.summary,
      tags: input.tags,
      entries: Vec::new(),
      created_at: now,
      updated_at: now,
    };

    self.selection.evidence = Some(evidence.id);
    self.db.evidence.insert(0, evidence);
    self.slot.save(&self.db)?;
    Ok(&self.db.evidence[0])
  }

  pub fn update_evidence(
    &mut self,
    id: Uuid,
    patch: EvidencePatch,
  ) -> Result<Option<&Evidence>, S::Error> {
    let Some(idx) = self.db.evidence.iter().position(|e| e.id == id) else {
      return Ok(None);
    };

    {
      let evidence = &mut self.db.evidence[idx];
      if let Some(title) = patch.title {
        evidence.title = title;
      }
      if let Some(kind) = patch.kind {
        evidence.kind = kind;
      }
      if let Some(summary) = patch.summary {
        evidence.summary = summary;
      }
      if let Some(tags) = patch.tags {
        evidence.tags = tags;
      }
      evidence.updated_at = now_ms();
    }

    self.slot.save(&self.db)?;
    Ok(Some(&self.db.evidence[idx]))
  }

  /// Remove an evidence thread. Its embedded entries vanish with it; there
  /// is no further cascade. Clears the evidence focus if it pointed here.
  pub fn delete_evidence(&mut self, id: Uuid) -> Result<bool, S::Error> {
    let before = self.db.evidence.len();
    self.db.evidence.retain(|e| e.id != id);
    if self.db.evidence.len() == before {
      return Ok(false);
    }

    if self.selection.evidence == Some(id) {
      self.selection.evidence = None;
    }

    self.slot.save(&self.db)?;
    Ok(true)
  }

  // ── Entries — append-only ─────────────────────────────────────────────

  /// Build an entry (id and timestamp assigned here; author and
  /// attachments normalized per the model's write-time rules), prepend it
  /// to the evidence's log, and refresh the evidence's `updated_at`.
  /// Entries have no update or delete path.
  pub fn add_entry(
    &mut self,
    evidence_id: Uuid,
    input: NewEntry,
  ) -> Result<Option<&Entry>, S::Error> {
    let Some(idx) = self.db.evidence.iter().position(|e| e.id == evidence_id)
    else {
      return Ok(None);
    };

    let now = now_ms();
    let author = if input.author.trim().is_empty() {
      "Unknown".to_owned()
    } else {
      input.author
    };
    let entry = Entry {
      id: Uuid::new_v4(),
      author,
      body: input.body,
      timestamp: now,
      attachments: input
        .attachments
        .into_iter()
        .filter_map(crate::model::Attachment::normalized)
        .collect(),
    };

    {
      let evidence = &mut self.db.evidence[idx];
      evidence.entries.insert(0, entry);
      evidence.updated_at = now;
    }

    self.slot.save(&self.db)?;
    Ok(Some(&self.db.evidence[idx].entries[0]))
  }

  // ── Wholesale replacement ─────────────────────────────────────────────

  /// Replace the entire database (the import path). No merge, no
  /// deduplication; both selections are cleared since they may point at
  /// records that no longer exist.
  pub fn replace(&mut self, db: Database) -> Result<(), S::Error> {
    self.db = db;
    self.selection = Selection::default();
    self.slot.save(&self.db)
  }
}
