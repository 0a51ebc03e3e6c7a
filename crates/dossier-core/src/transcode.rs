//! Export/import transcoder — the boundary between the in-memory
//! [`Database`] and its external JSON/CSV representations.
//!
//! JSON export is a literal pretty-printed serialization of the database,
//! and import accepts only a round-trip of that shape. CSV export is a
//! denormalized flattening: one row per entry, joined with its ancestor
//! evidence and investigation.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
  error::ImportError,
  model::{Database, Entry, Evidence, Investigation},
  Result,
};

// ─── JSON export ─────────────────────────────────────────────────────────────

/// Serialize the whole database, pretty-printed.
pub fn export_json(db: &Database) -> Result<String> {
  Ok(serde_json::to_string_pretty(db)?)
}

/// Default name for an export artifact: the prefix plus the date-truncated
/// ISO-8601 timestamp, e.g. `dossier-export-2026-08-24.json`.
pub fn export_filename(
  prefix: &str,
  extension: &str,
  now: DateTime<Utc>,
) -> String {
  format!("{prefix}-{}.{extension}", now.format("%Y-%m-%d"))
}

// ─── CSV export ──────────────────────────────────────────────────────────────

/// Literal column names; the header row is never quoted.
pub const CSV_HEADER: &str = "caseNumber,investigationTitle,\
investigationStatus,investigationTags,evidenceTitle,evidenceType,\
evidenceTags,entryTimestamp,entryAuthor,entryBody,attachments";

/// RFC 4180-style escaping: a field containing a comma, double quote, or
/// newline is wrapped in double quotes with inner quotes doubled; anything
/// else is emitted raw.
fn csv_field(field: &str) -> Cow<'_, str> {
  if field.contains([',', '"', '\n']) {
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(field)
  }
}

fn csv_row(
  investigation: Option<&Investigation>,
  evidence: &Evidence,
  entry: &Entry,
) -> String {
  // Evidence whose parent no longer resolves emits empty investigation
  // columns; the row itself is never dropped.
  let case_number = investigation
    .and_then(|i| i.case_number.as_deref())
    .unwrap_or_default();
  let inv_title = investigation.map(|i| i.title.as_str()).unwrap_or_default();
  let inv_status = investigation
    .map(|i| i.status.to_string())
    .unwrap_or_default();
  let inv_tags = investigation
    .map(|i| i.tags.join(";"))
    .unwrap_or_default();

  let attachments = entry
    .attachments
    .iter()
    .map(|a| format!("{}:{}", a.label, a.url))
    .collect::<Vec<_>>()
    .join(" | ");

  let fields = [
    case_number.to_owned(),
    inv_title.to_owned(),
    inv_status,
    inv_tags,
    evidence.title.clone(),
    evidence.kind.to_string(),
    evidence.tags.join(";"),
    entry
      .timestamp
      .to_rfc3339_opts(SecondsFormat::Millis, true),
    entry.author.clone(),
    entry.body.clone(),
    attachments,
  ];

  fields
    .iter()
    .map(|f| csv_field(f))
    .collect::<Vec<_>>()
    .join(",")
}

/// Flatten the database to CSV: a header row, then one row per entry.
/// Evidence and investigations with zero entries produce zero rows.
pub fn export_csv(db: &Database) -> String {
  let mut out = String::new();
  out.push_str(CSV_HEADER);
  out.push('\n');

  for evidence in &db.evidence {
    let investigation = db
      .investigations
      .iter()
      .find(|i| i.id == evidence.investigation_id);
    for entry in &evidence.entries {
      let _ = writeln!(out, "{}", csv_row(investigation, evidence, entry));
    }
  }

  out
}

// ─── JSON import ─────────────────────────────────────────────────────────────

/// Parse and validate an imported document.
///
/// The gate runs in two steps: a shallow shape check (the root must be an
/// object carrying `investigations` and `evidence` as arrays) that reports
/// the offending field by name, then a full typed decode so malformed
/// records are rejected at the boundary instead of passing through. The
/// caller replaces its database only on success.
pub fn import_json(content: &str) -> Result<Database, ImportError> {
  let value: serde_json::Value = serde_json::from_str(content)
    .map_err(|err| ImportError::Parse(err.to_string()))?;

  let Some(object) = value.as_object() else {
    return Err(ImportError::NotAnObject);
  };

  for field in ["investigations", "evidence"] {
    match object.get(field) {
      None => return Err(ImportError::MissingField(field)),
      Some(v) if !v.is_array() => return Err(ImportError::NotAnArray(field)),
      Some(_) => {}
    }
  }

  serde_json::from_value(value)
    .map_err(|err| ImportError::Decode { detail: err.to_string() })
}
