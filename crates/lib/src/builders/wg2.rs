//! WG2 display group.
//!
//! The next-generation Java display, built with ant. Optional; it only
//! joins the run when the operator asks and the Java toolchain is there.

use tracing::warn;

use crate::consts::WG2_DIR;
use crate::exec::ShellRunner;

use super::{BuildCtx, BuildError, BuildUnit, BuilderGroup};

struct Wg2Gui;

impl BuildUnit for Wg2Gui {
  fn name(&self) -> &str {
    "wg2-gui"
  }

  fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    if !gui2_available(shell) {
      warn!("ant or java not found, cannot build WG2");
      return false;
    }
    true
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    shell.run("ant", Some(&ctx.target.join(WG2_DIR)))?;
    Ok(())
  }
}

/// The WG2 group, last in dependency order.
pub fn group(enabled: bool) -> BuilderGroup {
  let mut g = BuilderGroup::new("wg2", "/WG2/trunk", WG2_DIR, vec![Box::new(Wg2Gui)]);
  g.set_enabled(enabled);
  g
}

/// Probe: are ant and a Java runtime on the PATH?
pub fn gui2_available(shell: &dyn ShellRunner) -> bool {
  shell.has_tool("ant") && shell.has_tool("java")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;

  use crate::builders::testutil::RecordingShell;

  #[test]
  fn build_runs_ant_in_checkout() {
    let g = group(true);
    let shell = RecordingShell::default();
    g.build(&shell, Path::new("/data/MRMS")).unwrap();
    assert_eq!(*shell.commands.borrow(), vec!["ant".to_string()]);
  }

  #[test]
  fn checkout_lands_in_wg2_dir() {
    let g = group(true);
    assert_eq!(g.checkout_dir(Path::new("/data/MRMS")), Path::new("/data/MRMS/WG2"));
  }
}
