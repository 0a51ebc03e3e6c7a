//! Atomic file replacement: write to a temp file in the target's
//! directory, fsync, then rename over the destination.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);
const TEMP_PREFIX: &str = ".dossier.tmp.";

pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let parent = path.parent().ok_or_else(|| {
    io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("path `{}` has no parent directory", path.display()),
    )
  })?;
  fs::create_dir_all(parent)?;

  let tmp_path = temp_path_in(parent, path)?;
  let mut tmp_file: File = OpenOptions::new()
    .create_new(true)
    .write(true)
    .open(&tmp_path)?;

  let write_result = (|| -> io::Result<()> {
    tmp_file.write_all(bytes)?;
    tmp_file.flush()?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    sync_parent_dir(parent)?;
    Ok(())
  })();

  if write_result.is_err() {
    let _ = fs::remove_file(&tmp_path);
  }
  write_result
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> io::Result<()> {
  File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_parent: &Path) -> io::Result<()> { Ok(()) }

fn temp_path_in(parent: &Path, final_path: &Path) -> io::Result<PathBuf> {
  let file_name = final_path
    .file_name()
    .and_then(|name| name.to_str())
    .ok_or_else(|| {
      io::Error::new(io::ErrorKind::InvalidInput, "invalid target filename")
    })?;
  let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
  let tmp_name =
    format!("{TEMP_PREFIX}{file_name}.{}.{counter}", std::process::id());
  Ok(parent.join(tmp_name))
}
