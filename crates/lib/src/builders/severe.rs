//! WDSS2 severe-weather group.
//!
//! The big one: the WDSS2 algorithm libraries, optionally the OpenGL
//! display GUI, built with whatever `-D` defines the flag merge produced.
//! The authorization file that feeds that merge lives in the checked-out
//! tree; `key_location` picks the research or realtime variant.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::consts::WDSS2_DIR;
use crate::exec::ShellRunner;

use super::{BuildCtx, BuildError, BuildUnit, BuilderGroup, configure_make_install};

struct SevereLibs;

impl BuildUnit for SevereLibs {
  fn name(&self) -> &str {
    "wdss2-libs"
  }

  fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    let mut ok = true;
    for tool in ["autoconf", "automake", "libtool"] {
      if !shell.has_tool(tool) {
        warn!(tool, "autotools missing");
        ok = false;
      }
    }
    ok
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    configure_make_install(shell, &ctx.target.join(WDSS2_DIR), ctx)
  }
}

struct GuiDisplay;

impl BuildUnit for GuiDisplay {
  fn name(&self) -> &str {
    "wg-display"
  }

  fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    if !gui_available(shell) {
      warn!("openGL libraries not found (libGL)");
      return false;
    }
    true
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    let dir = ctx.target.join(WDSS2_DIR).join("gui");
    shell.run(&format!("make {}", ctx.make_flags), Some(&dir))?;
    shell.run("make install", Some(&dir))?;
    Ok(())
  }
}

/// The severe-weather group, second in dependency order. The display GUI
/// unit is only attached when the operator asked for it.
pub fn group(enabled: bool, want_gui: bool) -> BuilderGroup {
  let mut units: Vec<Box<dyn BuildUnit>> = vec![Box::new(SevereLibs)];
  if want_gui {
    units.push(Box::new(GuiDisplay));
  }

  let mut g = BuilderGroup::new("wdss2", "/WDSS2/trunk", WDSS2_DIR, units);
  g.set_enabled(enabled);
  g
}

/// Path of the authorization file carrying the `-D` key defines. Research
/// builds use the keyless research file; everything else the realtime one.
pub fn key_location(target: &Path, research: bool) -> PathBuf {
  let name = if research { "research.auth" } else { "realtime.auth" };
  target.join(WDSS2_DIR).join("auth").join(name)
}

/// Probe: is OpenGL present for the display GUI?
pub fn gui_available(shell: &dyn ShellRunner) -> bool {
  shell.run_ok("ldconfig -p | grep -q libGL")
}

/// Probe: are the Python 2.7 development headers installed?
pub fn python_dev_available(shell: &dyn ShellRunner) -> bool {
  shell.run_ok("test -e /usr/include/python2.7/Python.h")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builders::testutil::RecordingShell;

  #[test]
  fn gui_unit_attached_only_on_request() {
    let shell = RecordingShell::default();

    let mut with_gui = group(true, true);
    with_gui.set_make_flags("--jobs=2");
    with_gui.build(&shell, Path::new("/data/MRMS")).unwrap();
    // libs (3 commands) + gui (2 commands)
    assert_eq!(shell.commands.borrow().len(), 5);

    let shell = RecordingShell::default();
    let without = group(true, false);
    without.build(&shell, Path::new("/data/MRMS")).unwrap();
    assert_eq!(shell.commands.borrow().len(), 3);
  }

  #[test]
  fn cpp_flags_reach_configure() {
    let shell = RecordingShell::default();
    let mut g = group(true, false);
    g.set_cpp_flags("-DEXPORT_VERSION -DPYTHON_DEVEL=2.7");
    g.build(&shell, Path::new("/data/MRMS")).unwrap();

    let first = shell.commands.borrow()[0].clone();
    assert!(first.starts_with("CPPFLAGS='-DEXPORT_VERSION -DPYTHON_DEVEL=2.7' ./autogen.sh"));
    assert!(first.contains("--prefix=/data/MRMS"));
  }

  #[test]
  fn key_location_picks_variant() {
    let target = Path::new("/data/MRMS");
    assert_eq!(
      key_location(target, true),
      Path::new("/data/MRMS/WDSS2/auth/research.auth")
    );
    assert_eq!(
      key_location(target, false),
      Path::new("/data/MRMS/WDSS2/auth/realtime.auth")
    );
  }
}
