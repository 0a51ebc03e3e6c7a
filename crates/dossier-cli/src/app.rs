//! Command handlers: each takes the repository, performs one operation,
//! and prints a short human-readable result. Confirmation prompts and file
//! reads/writes live here — the core never touches the terminal or the
//! file system beyond its own slot.

use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{bail, Context as _};
use chrono::{DateTime, Utc};
use dossier_core::{
  model::{
    Attachment, Evidence, EvidencePatch, Investigation, InvestigationPatch,
    NewEntry, NewEvidence, NewInvestigation,
  },
  repo::Repository,
  transcode,
  view::{self, InvestigationFilter},
};
use dossier_store_json::JsonFileSlot;
use uuid::Uuid;

use crate::{
  CaseAddArgs, CaseEditArgs, CaseListArgs, EntryAddArgs, EvidenceAddArgs,
  EvidenceEditArgs, ExportArgs, ExportFormat, ImportArgs, RmArgs,
};

type Repo = Repository<JsonFileSlot>;

// ─── Case commands ────────────────────────────────────────────────────────────

pub fn case_add(repo: &mut Repo, args: CaseAddArgs) -> anyhow::Result<()> {
  let investigation = repo.create_investigation(NewInvestigation {
    title:       args.title,
    case_number: args.case_number,
    description: args.description,
    status:      args.status,
    tags:        args.tags,
  })?;
  println!("created case {}", investigation.id);
  Ok(())
}

pub fn case_edit(repo: &mut Repo, args: CaseEditArgs) -> anyhow::Result<()> {
  let patch = InvestigationPatch {
    title:       args.title,
    case_number: args.case_number,
    description: args.description,
    status:      args.status,
    tags:        args.tags,
  };
  match repo.update_investigation(args.id, patch)? {
    Some(investigation) => {
      println!("updated case {}", investigation.id);
      Ok(())
    }
    None => bail!("no case with id {}", args.id),
  }
}

pub fn case_rm(repo: &mut Repo, args: RmArgs) -> anyhow::Result<()> {
  let Some(investigation) = repo.get_investigation(args.id) else {
    println!("no case with id {}; nothing to delete", args.id);
    return Ok(());
  };
  let owned = view::evidence_for(repo.db(), args.id).len();

  let prompt = format!(
    "delete case {:?} and its {owned} evidence thread(s)?",
    investigation.title
  );
  if !args.yes && !confirm(&prompt)? {
    println!("cancelled");
    return Ok(());
  }

  repo.delete_investigation(args.id)?;
  println!("deleted case {}", args.id);
  Ok(())
}

pub fn case_show(repo: &Repo, id: Uuid) -> anyhow::Result<()> {
  let Some(investigation) = repo.get_investigation(id) else {
    bail!("no case with id {id}");
  };

  print_investigation(investigation);
  for evidence in view::evidence_for(repo.db(), id) {
    println!();
    print_evidence(evidence);
  }
  Ok(())
}

pub fn case_list(repo: &Repo, args: CaseListArgs) -> anyhow::Result<()> {
  let filter = InvestigationFilter { status: args.status, query: args.query };
  for investigation in view::filter_investigations(repo.db(), &filter) {
    println!(
      "{}  {:<8}  {}  {}",
      investigation.id,
      investigation.status.to_string(),
      short_date(investigation.updated_at),
      investigation.title,
    );
  }
  Ok(())
}

// ─── Evidence commands ────────────────────────────────────────────────────────

pub fn evidence_add(
  repo: &mut Repo,
  args: EvidenceAddArgs,
) -> anyhow::Result<()> {
  let evidence = repo.create_evidence(args.case_id, NewEvidence {
    title:   args.title,
    kind:    args.kind,
    summary: args.summary,
    tags:    args.tags,
  })?;
  println!("created evidence {}", evidence.id);
  Ok(())
}

pub fn evidence_edit(
  repo: &mut Repo,
  args: EvidenceEditArgs,
) -> anyhow::Result<()> {
  let patch = EvidencePatch {
    title:   args.title,
    kind:    args.kind,
    summary: args.summary,
    tags:    args.tags,
  };
  match repo.update_evidence(args.id, patch)? {
    Some(evidence) => {
      println!("updated evidence {}", evidence.id);
      Ok(())
    }
    None => bail!("no evidence with id {}", args.id),
  }
}

pub fn evidence_rm(repo: &mut Repo, args: RmArgs) -> anyhow::Result<()> {
  let Some(evidence) = repo.get_evidence(args.id) else {
    println!("no evidence with id {}; nothing to delete", args.id);
    return Ok(());
  };

  let prompt = format!(
    "delete evidence {:?} and its {} entries?",
    evidence.title,
    evidence.entries.len()
  );
  if !args.yes && !confirm(&prompt)? {
    println!("cancelled");
    return Ok(());
  }

  repo.delete_evidence(args.id)?;
  println!("deleted evidence {}", args.id);
  Ok(())
}

pub fn evidence_list(repo: &Repo, case_id: Uuid) -> anyhow::Result<()> {
  for evidence in view::evidence_for(repo.db(), case_id) {
    println!(
      "{}  {:<17}  {}  {} ({} entries)",
      evidence.id,
      evidence.kind.to_string(),
      short_date(evidence.updated_at),
      evidence.title,
      evidence.entries.len(),
    );
  }
  Ok(())
}

// ─── Entry command ────────────────────────────────────────────────────────────

pub fn entry_add(repo: &mut Repo, args: EntryAddArgs) -> anyhow::Result<()> {
  let attachments =
    args.attachments.iter().map(|raw| parse_attachment(raw)).collect();

  let input = NewEntry {
    author: args.author,
    body: args.body,
    attachments,
  };
  match repo.add_entry(args.evidence_id, input)? {
    Some(entry) => {
      println!("added entry {}", entry.id);
      Ok(())
    }
    None => bail!("no evidence with id {}", args.evidence_id),
  }
}

// ─── Export / import ──────────────────────────────────────────────────────────

pub fn export(repo: &Repo, args: ExportArgs) -> anyhow::Result<()> {
  let (content, extension) = match args.format {
    ExportFormat::Json => (transcode::export_json(repo.db())?, "json"),
    ExportFormat::Csv => (transcode::export_csv(repo.db()), "csv"),
  };

  let out = args.out.unwrap_or_else(|| {
    PathBuf::from(transcode::export_filename(
      "dossier-export",
      extension,
      Utc::now(),
    ))
  });
  std::fs::write(&out, content)
    .with_context(|| format!("writing export to {}", out.display()))?;
  println!("wrote {}", out.display());
  Ok(())
}

pub fn import(repo: &mut Repo, args: ImportArgs) -> anyhow::Result<()> {
  let content = std::fs::read_to_string(&args.file)
    .with_context(|| format!("reading {}", args.file.display()))?;

  // Validation failures leave the current database untouched.
  let incoming = transcode::import_json(&content)?;

  let prompt = format!(
    "replace the entire database with {} case(s) and {} evidence thread(s)?",
    incoming.investigations.len(),
    incoming.evidence.len()
  );
  if !args.yes && !confirm(&prompt)? {
    println!("cancelled");
    return Ok(());
  }

  repo.replace(incoming)?;
  println!("imported {}", args.file.display());
  Ok(())
}

// ─── Capabilities ─────────────────────────────────────────────────────────────

/// Yes/no prompt on stdin. Anything but `y`/`yes` declines.
fn confirm(prompt: &str) -> io::Result<bool> {
  print!("{prompt} [y/N] ");
  io::stdout().flush()?;

  let mut answer = String::new();
  io::stdin().read_line(&mut answer)?;
  let answer = answer.trim();
  Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Parse an `--attach` argument: `LABEL=URL`, or a bare URL. A `=` inside a
/// bare URL (query strings) is not treated as a label separator.
fn parse_attachment(raw: &str) -> Attachment {
  match raw.split_once('=') {
    Some((label, url)) if !label.contains("://") => Attachment {
      label: label.to_owned(),
      url:   url.to_owned(),
    },
    _ => Attachment { label: String::new(), url: raw.to_owned() },
  }
}

// ─── Printing ─────────────────────────────────────────────────────────────────

fn short_date(at: DateTime<Utc>) -> String {
  at.format("%Y-%m-%d %H:%M").to_string()
}

fn print_investigation(investigation: &Investigation) {
  println!("case {}", investigation.id);
  println!("  title:       {}", investigation.title);
  if let Some(case_number) = &investigation.case_number {
    println!("  case number: {case_number}");
  }
  println!("  status:      {}", investigation.status);
  if !investigation.tags.is_empty() {
    println!("  tags:        {}", investigation.tags.join(", "));
  }
  if !investigation.description.is_empty() {
    println!("  description: {}", investigation.description);
  }
  println!("  created:     {}", short_date(investigation.created_at));
  println!("  updated:     {}", short_date(investigation.updated_at));
}

fn print_evidence(evidence: &Evidence) {
  println!("evidence {} ({})", evidence.id, evidence.kind);
  println!("  title:   {}", evidence.title);
  if !evidence.summary.is_empty() {
    println!("  summary: {}", evidence.summary);
  }
  for entry in &evidence.entries {
    println!("  [{}] {}: {}", short_date(entry.timestamp), entry.author, entry.body);
    for attachment in &entry.attachments {
      println!("      {} -> {}", attachment.label, attachment.url);
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
