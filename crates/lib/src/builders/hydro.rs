//! MRMS Hydro group.
//!
//! The hydrology libraries, plus a handful of small Fortran programs the
//! operator can opt into (they need gfortran, which not every build
//! machine has).

use tracing::warn;

use crate::config::{ConfigError, ConfigStore};
use crate::consts::HYDRO_DIR;
use crate::exec::ShellRunner;

use super::{BuildCtx, BuildError, BuildUnit, BuilderGroup, configure_make_install};

struct HydroLibs;

impl BuildUnit for HydroLibs {
  fn name(&self) -> &str {
    "hydro-libs"
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    configure_make_install(shell, &ctx.target.join(HYDRO_DIR), ctx)
  }
}

struct FortranTools;

impl BuildUnit for FortranTools {
  fn name(&self) -> &str {
    "hydro-fortran"
  }

  fn check_requirements(&self, shell: &dyn ShellRunner) -> bool {
    if !shell.has_tool("gfortran") {
      warn!("gfortran not found, cannot build the Hydro Fortran apps");
      return false;
    }
    true
  }

  fn build(&self, shell: &dyn ShellRunner, ctx: &BuildCtx) -> Result<(), BuildError> {
    let base = ctx.target.join(HYDRO_DIR);
    let bin = ctx.target.join("bin");

    for (subdir, program) in [
      ("algs/solar_zenith", "solar_zenith"),
      ("tools/convert_goes16_for_anc", "convert_goes16_for_anc"),
    ] {
      let dir = base.join(subdir);
      shell.run(&format!("make {}", ctx.make_flags), Some(&dir))?;
      shell.run(&format!("cp {} {}", program, bin.join(program).display()), Some(&dir))?;
    }
    Ok(())
  }
}

/// The Hydro group, third in dependency order. Whether the little Fortran
/// apps join in is its own question.
pub fn group(conf: &mut ConfigStore, enabled: bool) -> Result<BuilderGroup, ConfigError> {
  let mut units: Vec<Box<dyn BuildUnit>> = vec![Box::new(HydroLibs)];
  if enabled {
    let fortran = conf.get_bool("HYDROFORTRAN", "Build the Hydro Fortran apps?", false)?;
    if fortran {
      units.push(Box::new(FortranTools));
    }
  }

  let mut g = BuilderGroup::new("hydro", "/MRMS_hydro/trunk", HYDRO_DIR, units);
  g.set_enabled(enabled);
  Ok(g)
}
