//! Synchronous shell execution.
//!
//! Every external build tool (configure scripts, make, ant, svn) is driven
//! through a single [`ShellRunner`] capability so the orchestration layer can
//! be exercised with a recording fake. The real implementation runs the
//! command line through `/bin/sh -c`, blocking until it returns, and captures
//! both output streams.
//!
//! Callers are responsible for logging the command they run; `run` itself
//! stays quiet so credential-bearing command lines never reach the log.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
  /// The command could not be spawned at all.
  #[error("failed to spawn '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// The command ran and exited non-zero (or was killed).
  #[error("command '{cmd}' exited with status {code:?}")]
  CommandFailed { cmd: String, code: Option<i32> },
}

/// Captured output of a completed command.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
  pub stdout: String,
  pub stderr: String,
}

impl CmdOutput {
  /// First line of stdout, trimmed.
  pub fn first_line(&self) -> Option<&str> {
    self.stdout.lines().next().map(str::trim)
  }
}

/// Capability for running command lines synchronously.
pub trait ShellRunner {
  /// Run `cmd` through the shell, optionally in `cwd`. Non-zero exit is an
  /// error carrying the exit code.
  fn run(&self, cmd: &str, cwd: Option<&Path>) -> Result<CmdOutput, ExecError>;

  /// Run a command used purely as a probe; true iff it exited zero.
  fn run_ok(&self, cmd: &str) -> bool {
    self.run(cmd, None).is_ok()
  }

  /// First line of stdout from `cmd`, or `None` if it failed or printed
  /// nothing.
  fn first_line(&self, cmd: &str) -> Option<String> {
    self
      .run(cmd, None)
      .ok()
      .and_then(|out| out.first_line().map(str::to_string))
      .filter(|line| !line.is_empty())
  }

  /// True iff `tool` resolves on the PATH.
  fn has_tool(&self, tool: &str) -> bool {
    match self.first_line(&format!("which {}", tool)) {
      Some(line) => {
        debug!(tool, path = %line, "tool found");
        true
      }
      None => false,
    }
  }
}

/// The real shell, `/bin/sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl ShellRunner for SystemShell {
  fn run(&self, cmd: &str, cwd: Option<&Path>) -> Result<CmdOutput, ExecError> {
    let mut command = Command::new("/bin/sh");
    command.arg("-c").arg(cmd);
    if let Some(dir) = cwd {
      command.current_dir(dir);
    }

    let output = command.output().map_err(|e| ExecError::Spawn {
      cmd: cmd.to_string(),
      source: e,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      if !stderr.is_empty() {
        debug!(stderr = %stderr.trim_end(), "command stderr");
      }
      return Err(ExecError::CommandFailed {
        cmd: cmd.to_string(),
        code: output.status.code(),
      });
    }

    Ok(CmdOutput { stdout, stderr })
  }
}
