//! Record types — the Dossier database and its three record kinds.
//!
//! The serde attributes here pin down the on-disk JSON shape exactly:
//! camelCase field names and millisecond-epoch timestamps, so an exported
//! document is byte-compatible with the storage slot and imports are a
//! literal round-trip. Every type derives `PartialEq` so round-trips can be
//! asserted deep-equal in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Database ────────────────────────────────────────────────────────────────

/// The root aggregate and unit of persistence. The whole database is
/// serialized on every mutation and replaced wholesale on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
  /// Schema version tag. Carried through verbatim; nothing interprets it.
  #[serde(default = "default_version")]
  pub version:        u32,
  #[serde(default)]
  pub investigations: Vec<Investigation>,
  #[serde(default)]
  pub evidence:       Vec<Evidence>,
}

fn default_version() -> u32 { 1 }

impl Default for Database {
  fn default() -> Self {
    Self {
      version:        default_version(),
      investigations: Vec::new(),
      evidence:       Vec::new(),
    }
  }
}

// ─── Investigation ───────────────────────────────────────────────────────────

/// Workflow state of a case file.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Status {
  #[default]
  Open,
  Active,
  #[serde(rename = "On Hold")]
  #[strum(serialize = "On Hold")]
  OnHold,
  Closed,
}

/// A case file: the top-level record owning zero or more evidence threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default)]
  pub case_number: Option<String>,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status:      Status,
  #[serde(default)]
  pub tags:        Vec<String>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:  DateTime<Utc>,
  /// Refreshed on every mutation; always `>= created_at`.
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at:  DateTime<Utc>,
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// Category of an evidence thread.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum EvidenceType {
  Physical,
  Digital,
  #[serde(rename = "Witness Statement")]
  #[strum(serialize = "Witness Statement")]
  WitnessStatement,
  Forensics,
  Media,
  #[default]
  Other,
}

/// A named thread of related material within one investigation, carrying an
/// append-only log of entries (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
  pub id:               Uuid,
  /// Non-owning reference to the parent investigation. Referential
  /// integrity is enforced only by cascade delete: evidence whose parent
  /// is removed is removed in the same transition.
  pub investigation_id: Uuid,
  pub title:            String,
  #[serde(rename = "type", default)]
  pub kind:             EvidenceType,
  #[serde(default)]
  pub summary:          String,
  #[serde(default)]
  pub tags:             Vec<String>,
  /// Newest first; each new entry is prepended.
  #[serde(default)]
  pub entries:          Vec<Entry>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:       DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at:       DateTime<Utc>,
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A labelled link attached to an entry. Stored entries never contain an
/// attachment with an empty URL; that is filtered at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub label: String,
  pub url:   String,
}

impl Attachment {
  /// Apply the write-time normalization rules: drop the attachment when the
  /// URL is blank, and default a blank label to the URL itself.
  pub fn normalized(self) -> Option<Self> {
    let url = self.url.trim().to_owned();
    if url.is_empty() {
      return None;
    }
    let label = if self.label.trim().is_empty() {
      url.clone()
    } else {
      self.label
    };
    Some(Self { label, url })
  }
}

/// One immutable timestamped log line. Entries are never edited or deleted
/// once created; they vanish only with their owning evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
  pub id:          Uuid,
  pub author:      String,
  pub body:        String,
  /// Set once at creation, never updated.
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub timestamp:   DateTime<Utc>,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

// ─── Construction inputs ─────────────────────────────────────────────────────

/// Input to [`crate::repo::Repository::create_investigation`]. The id and
/// timestamps are always assigned by the repository.
#[derive(Debug, Clone, Default)]
pub struct NewInvestigation {
  pub title:       String,
  pub case_number: Option<String>,
  pub description: String,
  pub status:      Status,
  pub tags:        Vec<String>,
}

impl NewInvestigation {
  /// Convenience constructor with all optional fields at their defaults.
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }
}

/// Input to [`crate::repo::Repository::create_evidence`].
#[derive(Debug, Clone, Default)]
pub struct NewEvidence {
  pub title:   String,
  pub kind:    EvidenceType,
  pub summary: String,
  pub tags:    Vec<String>,
}

impl NewEvidence {
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }
}

/// Input to [`crate::repo::Repository::add_entry`]. A blank author becomes
/// `"Unknown"`; attachments pass through [`Attachment::normalized`].
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
  pub author:      String,
  pub body:        String,
  pub attachments: Vec<Attachment>,
}

/// Partial update for an investigation; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct InvestigationPatch {
  pub title:       Option<String>,
  pub case_number: Option<String>,
  pub description: Option<String>,
  pub status:      Option<Status>,
  pub tags:        Option<Vec<String>>,
}

/// Partial update for an evidence thread; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct EvidencePatch {
  pub title:   Option<String>,
  pub kind:    Option<EvidenceType>,
  pub summary: Option<String>,
  pub tags:    Option<Vec<String>>,
}
