//! Derived views — pure functions over the current [`Database`].
//!
//! Nothing here is cached or incrementally maintained; callers recompute
//! on every relevant change. Both listings sort descending by
//! `updated_at`, which in this model always exists and is `>= created_at`,
//! so no sort fallback is needed.

use uuid::Uuid;

use crate::model::{Database, Evidence, Investigation, Status};

// ─── Investigation listing ───────────────────────────────────────────────────

/// Filter parameters for [`filter_investigations`].
#[derive(Debug, Clone, Default)]
pub struct InvestigationFilter {
  /// Exact status match; `None` admits every status.
  pub status: Option<Status>,
  /// Case-insensitive substring matched against title, case number,
  /// description, and each tag (ANY field containing it matches). A blank
  /// query matches everything. Combined with `status` under AND semantics.
  pub query:  String,
}

fn matches_query(investigation: &Investigation, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  let hit = |field: &str| field.to_lowercase().contains(needle);

  hit(&investigation.title)
    || investigation.case_number.as_deref().is_some_and(hit)
    || hit(&investigation.description)
    || investigation.tags.iter().any(|tag| hit(tag))
}

/// The filtered, sorted case-file listing.
pub fn filter_investigations<'a>(
  db: &'a Database,
  filter: &InvestigationFilter,
) -> Vec<&'a Investigation> {
  let needle = filter.query.to_lowercase();

  let mut result: Vec<&Investigation> = db
    .investigations
    .iter()
    .filter(|i| filter.status.is_none_or(|wanted| i.status == wanted))
    .filter(|i| matches_query(i, &needle))
    .collect();

  result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
  result
}

// ─── Evidence listing ────────────────────────────────────────────────────────

/// Every evidence thread owned by `investigation_id`, most recently
/// updated first.
pub fn evidence_for(db: &Database, investigation_id: Uuid) -> Vec<&Evidence> {
  let mut result: Vec<&Evidence> = db
    .evidence
    .iter()
    .filter(|e| e.investigation_id == investigation_id)
    .collect();

  result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
  result
}
