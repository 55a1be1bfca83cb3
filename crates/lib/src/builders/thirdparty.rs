//! Third-party package group.
//!
//! Builds the bundled third-party tree (compression, imaging, netcdf and
//! friends) before anything that links against it. The tree carries its own
//! build script; we only need a working C/C++ toolchain.

use tracing::warn;

use crate::consts::THIRDPARTY_DIR;
use crate::exec::ShellRunner;

use super::{BuildCtx, BuildError, BuildUnit, BuilderGroup};

struct ThirdPartyLibs;

impl BuildUnit for ThirdPartyLibs {
  fn name(&self) -> &str {
    "thirdparty-libs"
  }

  fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    let mut ok = true;
    for tool in ["gcc", "g++", "make"] {
      if !shell.has_tool(tool) {
        warn!(tool, "compiler toolchain missing");
        ok = false;
      }
    }
    ok
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    let dir = ctx.target.join(THIRDPARTY_DIR);
    let cmd = format!(
      "MAKEFLAGS='{}' ./build.sh --prefix={}",
      ctx.make_flags,
      ctx.target.display()
    );
    shell.run(&cmd, Some(&dir))?;
    Ok(())
  }
}

/// The third-party group, first in dependency order.
pub fn group(enabled: bool) -> BuilderGroup {
  let mut g = BuilderGroup::new(
    "thirdparty",
    "/MRMS_3rdparty/trunk",
    THIRDPARTY_DIR,
    vec![Box::new(ThirdPartyLibs)],
  );
  g.set_enabled(enabled);
  g
}
