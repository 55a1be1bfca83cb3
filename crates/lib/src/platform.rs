//! Host identity and capacity.
//!
//! Provenance inputs for the build manifest (who ran the build, where) and
//! the default make parallelism. These are read-only environment facts,
//! not configuration.

use serde::Serialize;

use crate::exec::ShellRunner;

/// Identity of the operator and machine running the build.
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
  pub username: String,
  pub hostname: String,
  pub os_description: String,
}

impl HostInfo {
  /// Gather identity. The OS description prefers `/etc/redhat-release`
  /// (the build machines are RedHat-family) and falls back to the target
  /// triple's OS name.
  pub fn detect(shell: &dyn ShellRunner) -> Self {
    let os_description = shell
      .first_line("cat /etc/redhat-release")
      .unwrap_or_else(|| format!("{} {}", std::env::consts::OS, std::env::consts::ARCH));

    Self {
      username: whoami::username(),
      hostname: whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string()),
      os_description,
    }
  }
}

/// Default `make --jobs` count for this machine.
pub fn detect_jobs() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exec::SystemShell;

  #[test]
  fn detect_fills_every_field() {
    let info = HostInfo::detect(&SystemShell);
    assert!(!info.username.is_empty());
    assert!(!info.hostname.is_empty());
    assert!(!info.os_description.is_empty());
  }

  #[test]
  fn jobs_at_least_one() {
    assert!(detect_jobs() >= 1);
  }
}
