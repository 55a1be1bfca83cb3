//! Version-control checkout.
//!
//! Source retrieval is a capability so the pipeline can be tested with a
//! recording fake. The real client shells out to `svn checkout` against a
//! configured repository root, the way the build machines have always done
//! it. Credentials ride on the command line but are redacted in every log
//! line this module emits.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::exec::{ExecError, ShellRunner};

/// Errors from a checkout attempt.
#[derive(Debug, Error)]
pub enum VcsError {
  #[error("checkout of '{module}' into '{dest}' failed: {source}")]
  Checkout {
    module: String,
    dest: PathBuf,
    #[source]
    source: ExecError,
  },
}

/// Who is checking out. The username `.` means anonymous (no credentials
/// are sent at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
  pub username: String,
  pub password: Option<String>,
}

impl Credential {
  pub fn anonymous() -> Self {
    Self {
      username: ".".to_string(),
      password: None,
    }
  }

  pub fn is_anonymous(&self) -> bool {
    self.username == "."
  }
}

/// Capability for fetching versioned source into a destination directory.
pub trait VcsClient {
  /// Check out `module` (a repository-relative path such as
  /// `/MRMS_hydro/trunk`) into `dest` at `revision`.
  fn checkout(&self, module: &str, dest: &Path, credential: &Credential, revision: &str)
  -> Result<(), VcsError>;
}

/// `svn checkout` over the shell executor.
pub struct SvnClient<'a> {
  root: String,
  shell: &'a dyn ShellRunner,
}

impl<'a> SvnClient<'a> {
  pub fn new(root: impl Into<String>, shell: &'a dyn ShellRunner) -> Self {
    Self {
      root: root.into(),
      shell,
    }
  }

  fn command(&self, module: &str, dest: &Path, credential: &Credential, revision: &str) -> String {
    let mut cmd = format!("svn checkout --non-interactive -r {}", revision);
    if !credential.is_anonymous() {
      cmd.push_str(&format!(" --username {}", credential.username));
      if let Some(password) = &credential.password {
        cmd.push_str(&format!(" --password {}", password));
      }
    }
    cmd.push_str(&format!(" {}{} {}", self.root, module, dest.display()));
    cmd
  }
}

impl VcsClient for SvnClient<'_> {
  fn checkout(&self, module: &str, dest: &Path, credential: &Credential, revision: &str) -> Result<(), VcsError> {
    info!(
      module,
      dest = %dest.display(),
      revision,
      user = %credential.username,
      "checking out"
    );

    let cmd = self.command(module, dest, credential, revision);
    self.shell.run(&cmd, None).map_err(|e| VcsError::Checkout {
      module: module.to_string(),
      dest: dest.to_path_buf(),
      source: e,
    })?;

    Ok(())
  }
}
