//! Install target location.
//!
//! The build lands everything under one directory chosen once per run:
//! either the `TARGET` config key, or a menu pick over the standard
//! candidates. A candidate only wins after it proves creatable and
//! writable.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::warn;

/// Returns the user's home directory.
fn home_dir() -> PathBuf {
  env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// The standard install candidates, in menu order: home dated, home,
/// cwd-relative dated, cwd-relative.
pub fn candidate_paths(date: NaiveDate) -> Vec<PathBuf> {
  let stamp = date.format("%Y%m%d").to_string();
  let home = home_dir().join("MRMS");
  let relative = env::current_dir()
    .unwrap_or_else(|_| PathBuf::from("."))
    .join("MRMS");

  vec![
    PathBuf::from(format!("{}_{}", home.display(), stamp)),
    home,
    PathBuf::from(format!("{}_{}", relative.display(), stamp)),
    relative,
  ]
}

/// True iff `path` exists (or can be created) and is actually writable.
/// Probes with a real write, since permission bits lie on network mounts.
pub fn validate(path: &Path) -> bool {
  if !path.exists() {
    if let Err(e) = fs::create_dir_all(path) {
      warn!(path = %path.display(), error = %e, "could not create target directory");
      return false;
    }
  }

  let probe = path.join(".write_test");
  match fs::write(&probe, b"") {
    Ok(()) => {
      let _ = fs::remove_file(&probe);
      true
    }
    Err(e) => {
      warn!(path = %path.display(), error = %e, "target directory is not writable");
      false
    }
  }
}
