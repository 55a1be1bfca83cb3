//! Build groups and units.
//!
//! A [`BuildUnit`] is one buildable thing with a requirement probe and a
//! build body (a thin wrapper over external tools). A [`BuilderGroup`] is a
//! named, ordered collection of units standing for one logical module; it
//! owns the group-level state (enabled flag, injected make/cpp flags, the
//! repository module it checks out) and fans every phase call out to its
//! units in declaration order.
//!
//! Groups are registered by the driver in dependency order: third party,
//! then WDSS2 severe weather, then Hydro, then the WG2 GUI. That order is
//! the only thing guaranteeing a dependent module finds its prerequisites
//! installed.

pub mod hydro;
pub mod severe;
pub mod thirdparty;
pub mod wg2;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::exec::{ExecError, ShellRunner};
use crate::vcs::{Credential, VcsClient, VcsError};

/// Errors from a unit or group phase.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error(transparent)]
  Vcs(#[from] VcsError),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

/// Per-build inputs handed to every unit.
pub struct BuildCtx<'a> {
  /// The install target; all artifacts land under it.
  pub target: &'a Path,
  /// Extra make flags (`--jobs=N`), same for every unit.
  pub make_flags: &'a str,
  /// Rendered `-D` define string; empty for groups that take none.
  pub cpp_flags: &'a str,
}

/// One buildable thing inside a group.
pub trait BuildUnit {
  fn name(&self) -> &str;

  /// Probe external prerequisites without side effects. Implementations
  /// log their own diagnostic when they fail; the default has none.
  fn check_requirements(&self, _shell: &dyn ShellRunner) -> bool {
    true
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError>;
}

/// A named module: checkout source plus an ordered unit list.
pub struct BuilderGroup {
  name: &'static str,
  /// Repository-relative module path, e.g. `/MRMS_hydro/trunk`.
  module: &'static str,
  /// Directory under the target the module checks out into.
  subdir: &'static str,
  enabled: bool,
  make_flags: String,
  cpp_flags: String,
  units: Vec<Box<dyn BuildUnit>>,
}

impl BuilderGroup {
  pub fn new(name: &'static str, module: &'static str, subdir: &'static str, units: Vec<Box<dyn BuildUnit>>) -> Self {
    Self {
      name,
      module,
      subdir,
      enabled: true,
      make_flags: String::new(),
      cpp_flags: String::new(),
      units,
    }
  }

  pub fn name(&self) -> &str {
    self.name
  }

  pub fn enabled(&self) -> bool {
    self.enabled
  }

  pub fn set_enabled(&mut self, on: bool) {
    self.enabled = on;
  }

  pub fn set_make_flags(&mut self, flags: &str) {
    self.make_flags = flags.to_string();
  }

  pub fn set_cpp_flags(&mut self, flags: &str) {
    self.cpp_flags = flags.to_string();
  }

  /// Where this group's source lives under the target.
  pub fn checkout_dir(&self, target: &Path) -> PathBuf {
    target.join(self.subdir)
  }

  /// Check every unit's requirements. All units are probed even after a
  /// failure so the operator sees the full list of missing prerequisites.
  pub fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    let mut ok = true;
    for unit in &self.units {
      if !unit.check_requirements(shell) {
        error!(group = self.name, unit = unit.name(), "missing requirements");
        ok = false;
      }
    }
    ok
  }

  /// Fetch this group's source into the target.
  pub fn checkout(
    &self,
    vcs: &dyn VcsClient,
    credential: &Credential,
    revision: &str,
    target: &Path,
  ) -> Result<(), BuildError> {
    vcs.checkout(self.module, &self.checkout_dir(target), credential, revision)?;
    Ok(())
  }

  /// Build every unit, in declaration order, stopping at the first failure.
  pub fn build(&self, shell: &dyn ShellRunner, target: &Path) -> Result<(), BuildError> {
    let ctx = BuildCtx {
      target,
      make_flags: &self.make_flags,
      cpp_flags: &self.cpp_flags,
    };
    for unit in &self.units {
      info!(group = self.name, unit = unit.name(), "building");
      unit.build(shell, &ctx)?;
    }
    Ok(())
  }
}

/// The standard autotools dance: `autogen.sh`, `make`, `make install`,
/// run inside `dir` with artifacts installed under the target.
pub(crate) fn configure_make_install(
  shell: &dyn ShellRunner,
  dir: &Path,
  ctx: &BuildCtx,
) -> Result<(), BuildError> {
  let configure = if ctx.cpp_flags.is_empty() {
    format!("./autogen.sh --prefix={} --enable-shared", ctx.target.display())
  } else {
    format!(
      "CPPFLAGS='{}' ./autogen.sh --prefix={} --enable-shared",
      ctx.cpp_flags,
      ctx.target.display()
    )
  };

  shell.run(&configure, Some(dir))?;
  shell.run(&format!("make {}", ctx.make_flags), Some(dir))?;
  shell.run("make install", Some(dir))?;
  Ok(())
}
