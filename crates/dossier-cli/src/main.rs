//! `dossier` — command-line front end for the Dossier investigation tracker.
//!
//! # Usage
//!
//! ```
//! dossier case add --title "Missing shipment" --status Active
//! dossier case list --query narco --status Closed
//! dossier evidence add <CASE-ID> --title "Burner phone" --type Physical
//! dossier entry add <EVIDENCE-ID> --author alice --attach clip=https://x/1
//! dossier export csv
//! dossier import backup.json
//! ```
//!
//! The database lives in a single JSON file: `--data`, else `DOSSIER_DATA`,
//! else the platform data directory.

mod app;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dossier_core::{
  model::{EvidenceType, Status},
  repo::Repository,
};
use dossier_store_json::JsonFileSlot;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dossier", about = "Local investigation record keeper")]
struct Cli {
  /// Path to the database file.
  #[arg(long, env = "DOSSIER_DATA", value_name = "FILE", global = true)]
  data: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage case files.
  #[command(subcommand)]
  Case(CaseCommand),
  /// Manage evidence threads.
  #[command(subcommand)]
  Evidence(EvidenceCommand),
  /// Append log entries.
  #[command(subcommand)]
  Entry(EntryCommand),
  /// Export the database as JSON or CSV.
  Export(ExportArgs),
  /// Replace the database with an imported JSON document.
  Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
enum CaseCommand {
  Add(CaseAddArgs),
  Edit(CaseEditArgs),
  Rm(RmArgs),
  Show { id: Uuid },
  List(CaseListArgs),
}

#[derive(Args, Debug)]
struct CaseAddArgs {
  #[arg(long)]
  title: String,
  #[arg(long)]
  case_number: Option<String>,
  #[arg(long, default_value = "")]
  description: String,
  #[arg(long, default_value_t = Status::Open)]
  status: Status,
  #[arg(long = "tag")]
  tags: Vec<String>,
}

#[derive(Args, Debug)]
struct CaseEditArgs {
  id: Uuid,
  #[arg(long)]
  title: Option<String>,
  #[arg(long)]
  case_number: Option<String>,
  #[arg(long)]
  description: Option<String>,
  #[arg(long)]
  status: Option<Status>,
  /// Replaces the whole tag list when given at least once.
  #[arg(long = "tag")]
  tags: Option<Vec<String>>,
}

#[derive(Args, Debug)]
struct RmArgs {
  id: Uuid,
  /// Skip the confirmation prompt.
  #[arg(long)]
  yes: bool,
}

#[derive(Args, Debug)]
struct CaseListArgs {
  /// Exact status filter.
  #[arg(long)]
  status: Option<Status>,
  /// Case-insensitive substring over title, case number, description, tags.
  #[arg(long, default_value = "")]
  query: String,
}

#[derive(Subcommand, Debug)]
enum EvidenceCommand {
  Add(EvidenceAddArgs),
  Edit(EvidenceEditArgs),
  Rm(RmArgs),
  List { case_id: Uuid },
}

#[derive(Args, Debug)]
struct EvidenceAddArgs {
  case_id: Uuid,
  #[arg(long)]
  title: String,
  #[arg(long = "type", default_value_t = EvidenceType::Other)]
  kind: EvidenceType,
  #[arg(long, default_value = "")]
  summary: String,
  #[arg(long = "tag")]
  tags: Vec<String>,
}

#[derive(Args, Debug)]
struct EvidenceEditArgs {
  id: Uuid,
  #[arg(long)]
  title: Option<String>,
  #[arg(long = "type")]
  kind: Option<EvidenceType>,
  #[arg(long)]
  summary: Option<String>,
  #[arg(long = "tag")]
  tags: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
enum EntryCommand {
  Add(EntryAddArgs),
}

#[derive(Args, Debug)]
struct EntryAddArgs {
  evidence_id: Uuid,
  #[arg(long, default_value = "")]
  author: String,
  #[arg(long, default_value = "")]
  body: String,
  /// Attachment as `LABEL=URL` or a bare URL; repeatable.
  #[arg(long = "attach", value_name = "[LABEL=]URL")]
  attachments: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
  format: ExportFormat,
  /// Output file; defaults to `dossier-export-<date>.<ext>`.
  #[arg(long, value_name = "FILE")]
  out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ExportFormat {
  Json,
  Csv,
}

#[derive(Args, Debug)]
struct ImportArgs {
  file: PathBuf,
  /// Skip the confirmation prompt.
  #[arg(long)]
  yes: bool,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let data_path = cli.data.unwrap_or_else(default_data_path);
  let mut repo = Repository::open(JsonFileSlot::new(&data_path));

  match cli.command {
    Command::Case(cmd) => match cmd {
      CaseCommand::Add(args) => app::case_add(&mut repo, args),
      CaseCommand::Edit(args) => app::case_edit(&mut repo, args),
      CaseCommand::Rm(args) => app::case_rm(&mut repo, args),
      CaseCommand::Show { id } => app::case_show(&repo, id),
      CaseCommand::List(args) => app::case_list(&repo, args),
    },
    Command::Evidence(cmd) => match cmd {
      EvidenceCommand::Add(args) => app::evidence_add(&mut repo, args),
      EvidenceCommand::Edit(args) => app::evidence_edit(&mut repo, args),
      EvidenceCommand::Rm(args) => app::evidence_rm(&mut repo, args),
      EvidenceCommand::List { case_id } => app::evidence_list(&repo, case_id),
    },
    Command::Entry(EntryCommand::Add(args)) => app::entry_add(&mut repo, args),
    Command::Export(args) => app::export(&repo, args),
    Command::Import(args) => app::import(&mut repo, args),
  }
}

fn default_data_path() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("dossier")
    .join("dossier.json")
}
