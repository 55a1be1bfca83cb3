//! Build manifest.
//!
//! After a successful run a `VERSION` file is dropped into the target's
//! `bin` and `lib` directories recording who built what, when, and with
//! which answers. Operators diff these files across installs to work out
//! what an old build was configured with.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::config::HistoryEntry;
use crate::consts::{TOOL_NAME, version};
use crate::platform::HostInfo;

/// Everything the `VERSION` file records.
pub struct BuildManifest<'a> {
  pub completed: DateTime<Local>,
  pub host: &'a HostInfo,
  pub options: &'a [HistoryEntry],
}

impl BuildManifest<'_> {
  /// The manifest text, human-readable. History values arrive already
  /// redacted, so secrets never land on disk here.
  pub fn render(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} version {}\n", TOOL_NAME, version()));
    out.push_str(&format!("Completed: {}\n", self.completed.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!(
      "Built by: {} on {} ({})\n",
      self.host.username, self.host.hostname, self.host.os_description
    ));
    out.push_str("Options:\n");
    for entry in self.options {
      out.push_str(&format!("\t{}: {} = {}\n", entry.key, entry.label, entry.value));
    }
    out
  }

  /// Write the manifest under the target, to `bin/VERSION` and mirrored to
  /// `lib/VERSION`. Returns the paths written.
  pub fn write(&self, target: &Path) -> io::Result<Vec<PathBuf>> {
    let text = self.render();
    let mut written = Vec::new();
    for dir in ["bin", "lib"] {
      let dir = target.join(dir);
      fs::create_dir_all(&dir)?;
      let path = dir.join("VERSION");
      fs::write(&path, &text)?;
      info!(path = %path.display(), "wrote build manifest");
      written.push(path);
    }
    Ok(written)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Provenance;
  use tempfile::TempDir;

  fn host() -> HostInfo {
    HostInfo {
      username: "toomey".to_string(),
      hostname: "build7".to_string(),
      os_description: "CentOS Linux 7".to_string(),
    }
  }

  fn entry(key: &str, label: &str, value: &str) -> HistoryEntry {
    HistoryEntry {
      key: key.to_string(),
      label: label.to_string(),
      value: value.to_string(),
      provenance: Provenance::User,
    }
  }

  #[test]
  fn render_lists_every_option() {
    let host = host();
    let options = vec![
      entry("CHECKOUT", "Check out source?", "yes"),
      entry("PASSWORD", "SVN password", "(hidden)"),
    ];
    let manifest = BuildManifest {
      completed: Local::now(),
      host: &host,
      options: &options,
    };

    let text = manifest.render();
    assert!(text.contains("Built by: toomey on build7 (CentOS Linux 7)"));
    assert!(text.contains("\tCHECKOUT: Check out source? = yes"));
    assert!(text.contains("\tPASSWORD: SVN password = (hidden)"));
  }

  #[test]
  fn write_mirrors_bin_and_lib() {
    let temp = TempDir::new().unwrap();
    let host = host();
    let options = vec![entry("JOBS", "Make jobs", "8")];
    let manifest = BuildManifest {
      completed: Local::now(),
      host: &host,
      options: &options,
    };

    let written = manifest.write(temp.path()).unwrap();
    assert_eq!(written.len(), 2);

    let bin = std::fs::read_to_string(temp.path().join("bin/VERSION")).unwrap();
    let lib = std::fs::read_to_string(temp.path().join("lib/VERSION")).unwrap();
    assert_eq!(bin, lib);
    assert!(bin.starts_with("mrmsbuild version 1.1"));
  }
}
