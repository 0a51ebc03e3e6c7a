//! Tests for the repository, derived views, and transcoder, run against an
//! in-memory slot so every mutation still round-trips through serde.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  error::ImportError,
  model::{
    Attachment, Database, EvidencePatch, EvidenceType, InvestigationPatch,
    NewEntry, NewEvidence, NewInvestigation, Status,
  },
  repo::Repository,
  slot::MemorySlot,
  transcode, view,
};

/// Timestamps are millisecond-granular; a short sleep guarantees the next
/// mutation lands in a later millisecond when a test depends on ordering.
fn tick() { std::thread::sleep(std::time::Duration::from_millis(2)); }

fn repo() -> Repository<MemorySlot> { Repository::open(MemorySlot::new()) }

fn entry(author: &str, body: &str) -> NewEntry {
  NewEntry {
    author:      author.into(),
    body:        body.into(),
    attachments: Vec::new(),
  }
}

// ─── Investigations ──────────────────────────────────────────────────────────

#[test]
fn create_investigation_assigns_id_and_timestamps() {
  let mut r = repo();

  let inv = r
    .create_investigation(NewInvestigation::new("Missing shipment"))
    .unwrap();
  assert_eq!(inv.title, "Missing shipment");
  assert_eq!(inv.status, Status::Open);
  assert_eq!(inv.created_at, inv.updated_at);

  let id = inv.id;
  assert_eq!(r.selection().investigation, Some(id));
  assert!(r.get_investigation(id).is_some());
}

#[test]
fn create_investigation_inserts_at_front() {
  let mut r = repo();
  let first = r
    .create_investigation(NewInvestigation::new("first"))
    .unwrap()
    .id;
  let second = r
    .create_investigation(NewInvestigation::new("second"))
    .unwrap()
    .id;

  let ids: Vec<Uuid> = r.db().investigations.iter().map(|i| i.id).collect();
  assert_eq!(ids, vec![second, first]);
}

#[test]
fn update_investigation_merges_and_refreshes_updated_at() {
  let mut r = repo();
  let created = r
    .create_investigation(NewInvestigation::new("case"))
    .unwrap()
    .clone();

  let updated = r
    .update_investigation(created.id, InvestigationPatch {
      status: Some(Status::Closed),
      ..Default::default()
    })
    .unwrap()
    .expect("record exists")
    .clone();

  assert_eq!(updated.status, Status::Closed);
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.created_at, created.created_at);
  assert_eq!(updated.title, "case");
  assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn update_unknown_investigation_is_a_noop() {
  let mut r = repo();
  r.create_investigation(NewInvestigation::new("case")).unwrap();
  let before = r.slot().raw();

  let result = r
    .update_investigation(Uuid::new_v4(), InvestigationPatch {
      title: Some("renamed".into()),
      ..Default::default()
    })
    .unwrap();

  assert!(result.is_none());
  // No save happened for the no-op.
  assert_eq!(r.slot().raw(), before);
}

#[test]
fn every_mutation_persists_immediately() {
  let mut r = repo();
  let inv = r
    .create_investigation(NewInvestigation::new("case"))
    .unwrap()
    .clone();

  let reopened = Repository::open({
    let slot = MemorySlot::new();
    slot.seed(r.slot().raw().unwrap());
    slot
  });
  assert_eq!(reopened.db().investigations, vec![inv]);
}

// ─── Cascade delete ──────────────────────────────────────────────────────────

#[test]
fn delete_investigation_cascades_to_owned_evidence() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let b = r.create_investigation(NewInvestigation::new("B")).unwrap().id;
  let e1 = r.create_evidence(a, NewEvidence::new("E1")).unwrap().id;
  let e2 = r.create_evidence(b, NewEvidence::new("E2")).unwrap().id;

  assert!(r.delete_investigation(a).unwrap());

  let remaining_inv: Vec<Uuid> =
    r.db().investigations.iter().map(|i| i.id).collect();
  let remaining_ev: Vec<Uuid> = r.db().evidence.iter().map(|e| e.id).collect();
  assert_eq!(remaining_inv, vec![b]);
  assert_eq!(remaining_ev, vec![e2]);
  assert!(!remaining_ev.contains(&e1));
}

#[test]
fn delete_investigation_clears_selection_and_cascaded_focus() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let e1 = r.create_evidence(a, NewEvidence::new("E1")).unwrap().id;

  assert_eq!(r.selection().investigation, Some(a));
  assert_eq!(r.selection().evidence, Some(e1));

  r.delete_investigation(a).unwrap();
  assert_eq!(r.selection().investigation, None);
  assert_eq!(r.selection().evidence, None);
}

#[test]
fn delete_investigation_keeps_unrelated_focus() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let b = r.create_investigation(NewInvestigation::new("B")).unwrap().id;
  let eb = r.create_evidence(b, NewEvidence::new("EB")).unwrap().id;

  r.delete_investigation(a).unwrap();
  // B was created after A, so it holds the selection; its evidence was not
  // cascaded away.
  assert_eq!(r.selection().investigation, Some(b));
  assert_eq!(r.selection().evidence, Some(eb));
}

#[test]
fn delete_unknown_investigation_is_a_noop() {
  let mut r = repo();
  r.create_investigation(NewInvestigation::new("case")).unwrap();
  assert!(!r.delete_investigation(Uuid::new_v4()).unwrap());
  assert_eq!(r.db().investigations.len(), 1);
}

// ─── Evidence ────────────────────────────────────────────────────────────────

#[test]
fn create_evidence_starts_with_empty_log_and_focus() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r
    .create_evidence(a, NewEvidence {
      title: "Burner phone".into(),
      kind: EvidenceType::Physical,
      ..Default::default()
    })
    .unwrap()
    .clone();

  assert_eq!(ev.investigation_id, a);
  assert!(ev.entries.is_empty());
  assert_eq!(r.selection().evidence, Some(ev.id));
}

#[test]
fn update_evidence_refreshes_updated_at_only() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let created = r
    .create_evidence(a, NewEvidence::new("thread"))
    .unwrap()
    .clone();

  let updated = r
    .update_evidence(created.id, EvidencePatch {
      kind: Some(EvidenceType::Forensics),
      ..Default::default()
    })
    .unwrap()
    .expect("record exists")
    .clone();

  assert_eq!(updated.kind, EvidenceType::Forensics);
  assert_eq!(updated.created_at, created.created_at);
  assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn delete_evidence_clears_focus_but_not_parent() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;

  assert!(r.delete_evidence(ev).unwrap());
  assert_eq!(r.selection().evidence, None);
  assert_eq!(r.selection().investigation, Some(a));
  assert!(r.db().investigations.iter().any(|i| i.id == a));
}

// ─── Entries ─────────────────────────────────────────────────────────────────

#[test]
fn add_entry_always_prepends() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;

  let x = r.add_entry(ev, entry("alice", "X")).unwrap().unwrap().id;
  let y = r.add_entry(ev, entry("bob", "Y")).unwrap().unwrap().id;

  let entries = &r.get_evidence(ev).unwrap().entries;
  let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![y, x]);
}

#[test]
fn add_entry_refreshes_evidence_updated_at() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let created = r
    .create_evidence(a, NewEvidence::new("thread"))
    .unwrap()
    .clone();

  r.add_entry(created.id, entry("alice", "note")).unwrap();
  let after = r.get_evidence(created.id).unwrap();
  assert!(after.updated_at >= created.updated_at);
  assert_eq!(after.updated_at, after.entries[0].timestamp);
}

#[test]
fn blank_author_defaults_to_unknown() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;

  let recorded = r.add_entry(ev, entry("   ", "note")).unwrap().unwrap();
  assert_eq!(recorded.author, "Unknown");
}

#[test]
fn attachments_normalized_at_construction() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;

  let recorded = r
    .add_entry(ev, NewEntry {
      author: "alice".into(),
      body:   String::new(),
      attachments: vec![
        Attachment { label: "report".into(), url: "https://x/report".into() },
        Attachment { label: String::new(), url: "https://x/photo".into() },
        Attachment { label: "dropped".into(), url: "  ".into() },
      ],
    })
    .unwrap()
    .unwrap()
    .clone();

  assert_eq!(recorded.attachments, vec![
    Attachment { label: "report".into(), url: "https://x/report".into() },
    // Blank label defaults to the URL itself.
    Attachment { label: "https://x/photo".into(), url: "https://x/photo".into() },
  ]);
}

#[test]
fn add_entry_to_unknown_evidence_is_a_noop() {
  let mut r = repo();
  assert!(r.add_entry(Uuid::new_v4(), entry("a", "b")).unwrap().is_none());
}

// ─── Identifier uniqueness ───────────────────────────────────────────────────

#[test]
fn identifiers_unique_across_ten_thousand_creations() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;

  let mut seen = HashSet::from([a, ev]);
  for i in 0..10_000 {
    let id = r
      .add_entry(ev, entry("gen", &i.to_string()))
      .unwrap()
      .unwrap()
      .id;
    assert!(seen.insert(id), "identifier collision at {i}");
  }
}

// ─── Derived views ───────────────────────────────────────────────────────────

fn seeded_for_filtering() -> Repository<MemorySlot> {
  let mut r = repo();
  r.create_investigation(NewInvestigation {
    title: "Narcotics ring".into(),
    status: Status::Active,
    ..Default::default()
  })
  .unwrap();
  r.create_investigation(NewInvestigation {
    title: "Warehouse fire".into(),
    case_number: Some("NARCO-77".into()),
    status: Status::Closed,
    ..Default::default()
  })
  .unwrap();
  r.create_investigation(NewInvestigation {
    title: "Stolen ledger".into(),
    description: "possible narco connection".into(),
    status: Status::Closed,
    ..Default::default()
  })
  .unwrap();
  r.create_investigation(NewInvestigation {
    title: "Harbour surveillance".into(),
    tags: vec!["narco".into(), "port".into()],
    status: Status::OnHold,
    ..Default::default()
  })
  .unwrap();
  r.create_investigation(NewInvestigation {
    title: "Unrelated burglary".into(),
    status: Status::Open,
    ..Default::default()
  })
  .unwrap();
  r
}

#[test]
fn query_matches_title_case_number_description_and_tags() {
  let r = seeded_for_filtering();
  let hits = view::filter_investigations(r.db(), &view::InvestigationFilter {
    query: "narco".into(),
    ..Default::default()
  });

  let titles: HashSet<&str> = hits.iter().map(|i| i.title.as_str()).collect();
  assert_eq!(
    titles,
    HashSet::from([
      "Narcotics ring",
      "Warehouse fire",
      "Stolen ledger",
      "Harbour surveillance",
    ])
  );
}

#[test]
fn status_filter_alone_returns_exactly_that_status() {
  let r = seeded_for_filtering();
  let hits = view::filter_investigations(r.db(), &view::InvestigationFilter {
    status: Some(Status::Closed),
    ..Default::default()
  });
  assert_eq!(hits.len(), 2);
  assert!(hits.iter().all(|i| i.status == Status::Closed));
}

#[test]
fn status_and_query_combine_with_and_semantics() {
  let r = seeded_for_filtering();
  let hits = view::filter_investigations(r.db(), &view::InvestigationFilter {
    status: Some(Status::Closed),
    query:  "narco".into(),
  });
  let titles: HashSet<&str> = hits.iter().map(|i| i.title.as_str()).collect();
  assert_eq!(titles, HashSet::from(["Warehouse fire", "Stolen ledger"]));
}

#[test]
fn investigations_sorted_by_updated_at_descending() {
  let mut r = repo();
  let first = r.create_investigation(NewInvestigation::new("first")).unwrap().id;
  let second = r
    .create_investigation(NewInvestigation::new("second"))
    .unwrap()
    .id;

  // Touching `first` moves it to the top of the derived view.
  tick();
  r.update_investigation(first, InvestigationPatch {
    description: Some("touched".into()),
    ..Default::default()
  })
  .unwrap();

  let listed: Vec<Uuid> =
    view::filter_investigations(r.db(), &view::InvestigationFilter::default())
      .iter()
      .map(|i| i.id)
      .collect();
  assert_eq!(listed, vec![first, second]);
}

#[test]
fn evidence_view_filters_by_owner_and_sorts_descending() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let b = r.create_investigation(NewInvestigation::new("B")).unwrap().id;
  let e1 = r.create_evidence(a, NewEvidence::new("E1")).unwrap().id;
  let e2 = r.create_evidence(a, NewEvidence::new("E2")).unwrap().id;
  r.create_evidence(b, NewEvidence::new("EB")).unwrap();

  // An entry on E1 makes it the most recently updated.
  tick();
  r.add_entry(e1, entry("alice", "note")).unwrap();

  let listed: Vec<Uuid> =
    view::evidence_for(r.db(), a).iter().map(|e| e.id).collect();
  assert_eq!(listed, vec![e1, e2]);
}

// ─── Transcoder: JSON ────────────────────────────────────────────────────────

#[test]
fn json_export_import_round_trip_is_deep_equal() {
  let mut r = repo();
  let a = r
    .create_investigation(NewInvestigation {
      title: "Round trip".into(),
      case_number: Some("RT-1".into()),
      tags: vec!["x".into()],
      ..Default::default()
    })
    .unwrap()
    .id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;
  r.add_entry(ev, NewEntry {
    author: "alice".into(),
    body:   "hello".into(),
    attachments: vec![Attachment {
      label: String::new(),
      url:   "https://x/1".into(),
    }],
  })
  .unwrap();

  let exported = transcode::export_json(r.db()).unwrap();
  let imported = transcode::import_json(&exported).unwrap();
  assert_eq!(&imported, r.db());
}

#[test]
fn import_rejects_non_object_root() {
  assert_eq!(transcode::import_json("[1,2]"), Err(ImportError::NotAnObject));
}

#[test]
fn import_rejects_missing_sequences() {
  let err = transcode::import_json(r#"{"evidence": []}"#).unwrap_err();
  assert_eq!(err, ImportError::MissingField("investigations"));
}

#[test]
fn import_rejects_non_array_sequences_and_leaves_db_untouched() {
  let mut r = repo();
  r.create_investigation(NewInvestigation::new("keep me")).unwrap();
  let before = r.db().clone();

  let err = transcode::import_json(
    r#"{"investigations": "not-an-array", "evidence": []}"#,
  )
  .unwrap_err();
  assert_eq!(err, ImportError::NotAnArray("investigations"));

  // The repository is only touched on success.
  assert_eq!(r.db(), &before);
}

#[test]
fn import_rejects_malformed_records() {
  let err = transcode::import_json(
    r#"{"investigations": [{"title": 7}], "evidence": []}"#,
  )
  .unwrap_err();
  assert!(matches!(err, ImportError::Decode { .. }));
}

#[test]
fn import_carries_version_verbatim() {
  let db = transcode::import_json(
    r#"{"version": 42, "investigations": [], "evidence": []}"#,
  )
  .unwrap();
  assert_eq!(db.version, 42);
}

#[test]
fn replace_swaps_database_and_clears_selection() {
  let mut r = repo();
  r.create_investigation(NewInvestigation::new("old")).unwrap();
  assert!(r.selection().investigation.is_some());

  r.replace(Database::default()).unwrap();
  assert!(r.db().investigations.is_empty());
  assert_eq!(r.selection(), crate::repo::Selection::default());

  // The replacement was persisted.
  let reopened = Repository::open({
    let slot = MemorySlot::new();
    slot.seed(r.slot().raw().unwrap());
    slot
  });
  assert!(reopened.db().investigations.is_empty());
}

// ─── Transcoder: CSV ─────────────────────────────────────────────────────────

#[test]
fn csv_escapes_commas_and_leaves_plain_fields_raw() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;
  r.add_entry(ev, entry("alice", "hello, world")).unwrap();
  r.add_entry(ev, entry("bob", "plain")).unwrap();

  let csv = transcode::export_csv(r.db());
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(lines[0], transcode::CSV_HEADER);
  assert_eq!(lines.len(), 3);

  // Newest entry first: "plain" precedes "hello, world".
  assert!(lines[1].ends_with(",plain,"));
  assert!(lines[2].contains("\"hello, world\""));

  // The quoted comma does not break the column count.
  assert_eq!(split_unquoted_commas(lines[2]).len(), 11);
  assert_eq!(split_unquoted_commas(lines[1]).len(), 11);
}

#[test]
fn csv_doubles_inner_quotes() {
  let mut r = repo();
  let a = r.create_investigation(NewInvestigation::new("A")).unwrap().id;
  let ev = r.create_evidence(a, NewEvidence::new("thread")).unwrap().id;
  r.add_entry(ev, entry("alice", r#"said "stop" twice"#)).unwrap();

  let csv = transcode::export_csv(r.db());
  assert!(csv.contains(r#""said ""stop"" twice""#));
}

#[test]
fn csv_emits_one_row_per_entry_and_joins_ancestors() {
  let mut r = repo();
  let a = r
    .create_investigation(NewInvestigation {
      title: "Harbour".into(),
      case_number: Some("H-9".into()),
      status: Status::OnHold,
      tags: vec!["port".into(), "night".into()],
      ..Default::default()
    })
    .unwrap()
    .id;
  let ev = r
    .create_evidence(a, NewEvidence {
      title: "CCTV".into(),
      kind: EvidenceType::WitnessStatement,
      tags: vec!["camera".into()],
      ..Default::default()
    })
    .unwrap()
    .id;
  // A second thread with no entries contributes no rows.
  r.create_evidence(a, NewEvidence::new("empty thread")).unwrap();

  r.add_entry(ev, NewEntry {
    author: "carol".into(),
    body:   "footage reviewed".into(),
    attachments: vec![
      Attachment { label: "clip".into(), url: "https://x/clip".into() },
      Attachment { label: String::new(), url: "https://x/raw".into() },
    ],
  })
  .unwrap();

  let csv = transcode::export_csv(r.db());
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(lines.len(), 2);

  let fields = split_unquoted_commas(lines[1]);
  assert_eq!(fields[0], "H-9");
  assert_eq!(fields[1], "Harbour");
  assert_eq!(fields[2], "On Hold");
  assert_eq!(fields[3], "port;night");
  assert_eq!(fields[4], "CCTV");
  assert_eq!(fields[5], "Witness Statement");
  assert_eq!(fields[6], "camera");
  assert_eq!(fields[8], "carol");
  assert_eq!(fields[9], "footage reviewed");
  assert_eq!(fields[10], "clip:https://x/clip | https://x/raw:https://x/raw");
}

#[test]
fn csv_orphaned_evidence_emits_empty_investigation_columns() {
  // Build a database where evidence references a dead investigation.
  // The repository cannot produce this state (cascade delete), so import
  // the shape directly — shallow validation admits it.
  let doc = r#"{
    "version": 1,
    "investigations": [],
    "evidence": [{
      "id": "11111111-1111-4111-8111-111111111111",
      "investigationId": "22222222-2222-4222-8222-222222222222",
      "title": "orphan thread",
      "type": "Digital",
      "summary": "",
      "tags": [],
      "entries": [{
        "id": "33333333-3333-4333-8333-333333333333",
        "author": "dan",
        "body": "still here",
        "timestamp": 1700000000000,
        "attachments": []
      }],
      "createdAt": 1700000000000,
      "updatedAt": 1700000000000
    }]
  }"#;
  let db = transcode::import_json(doc).unwrap();

  let csv = transcode::export_csv(&db);
  let lines: Vec<&str> = csv.lines().collect();
  assert_eq!(lines.len(), 2, "the row is never dropped");

  let fields = split_unquoted_commas(lines[1]);
  assert_eq!(&fields[..4], &["", "", "", ""]);
  assert_eq!(fields[4], "orphan thread");
  assert_eq!(fields[7], "2023-11-14T22:13:20.000Z");
}

#[test]
fn export_filename_truncates_to_date() {
  let at = chrono::DateTime::parse_from_rfc3339("2026-08-24T15:04:05Z")
    .unwrap()
    .with_timezone(&chrono::Utc);
  assert_eq!(
    transcode::export_filename("dossier-export", "json", at),
    "dossier-export-2026-08-24.json"
  );
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Split a CSV line on commas that are outside quoted fields.
fn split_unquoted_commas(line: &str) -> Vec<String> {
  let mut fields = vec![String::new()];
  let mut in_quotes = false;
  for c in line.chars() {
    match c {
      '"' => in_quotes = !in_quotes,
      ',' if !in_quotes => fields.push(String::new()),
      _ => fields.last_mut().unwrap().push(c),
    }
  }
  fields
}
