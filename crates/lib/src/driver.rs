//! The build pipeline.
//!
//! One run walks a fixed sequence of phases: load configuration, plan the
//! groups, gate on requirements, resolve the install target, check out
//! source, resolve compiler flags, build, write the manifest. Phases never
//! run out of order and never run twice; a disabled group is invisible to
//! every phase.
//!
//! The group order is declared here and nowhere else. Third party first
//! (everything links against it), then WDSS2, then Hydro, then WG2.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

use crate::builders::{hydro, severe, thirdparty, wg2, BuildError, BuilderGroup};
use crate::config::{ConfigError, ConfigStore, HistoryEntry, Prompter};
use crate::consts::DEFAULT_SVN_ROOT;
use crate::exec::ShellRunner;
use crate::flags::{self, FlagMap};
use crate::manifest::BuildManifest;
use crate::platform::{detect_jobs, HostInfo};
use crate::target;
use crate::vcs::{Credential, SvnClient, VcsClient};

/// How many times the target menu re-asks before giving up.
const TARGET_ATTEMPTS: usize = 5;

/// Pipeline phases, in their only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Plan,
  RequirementGate,
  TargetResolve,
  Checkout,
  FlagResolve,
  Build,
  Manifest,
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Phase::Plan => "plan",
      Phase::RequirementGate => "requirement gate",
      Phase::TargetResolve => "target resolve",
      Phase::Checkout => "checkout",
      Phase::FlagResolve => "flag resolve",
      Phase::Build => "build",
      Phase::Manifest => "manifest",
    };
    f.write_str(name)
  }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// One or more enabled groups is missing prerequisites. Nothing was
  /// checked out or built.
  #[error("missing requirements for: {}", .groups.join(", "))]
  RequirementsNotMet { groups: Vec<String> },

  /// No writable install target could be produced.
  #[error("no writable target directory")]
  NoTarget,

  /// A group failed mid-phase; later groups did not run.
  #[error("group '{group}' failed during {phase}: {source}")]
  GroupFailed {
    phase: Phase,
    group: String,
    #[source]
    source: BuildError,
  },

  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Inputs the caller settles before the run starts.
pub struct PipelineOptions {
  pub config_path: PathBuf,
  /// Skip the target menu and use this path.
  pub target_override: Option<PathBuf>,
}

/// The resolved plan: which groups run, and the toggles later phases need.
pub struct Plan {
  pub groups: Vec<BuilderGroup>,
  pub checkout: bool,
  pub research: bool,
  pub python_dev: bool,
  pub export: bool,
  pub jobs: usize,
}

impl Plan {
  /// Names of the groups that will actually run, in build order.
  pub fn enabled_names(&self) -> Vec<&str> {
    self.groups.iter().filter(|g| g.enabled()).map(|g| g.name()).collect()
  }
}

/// Outcome of a completed run.
pub struct PipelineReport {
  pub target: PathBuf,
  /// Group names built, in order.
  pub built: Vec<String>,
  pub options: Vec<HistoryEntry>,
}

/// The driver itself. Owns the question store; borrows the shell.
pub struct Pipeline<'a> {
  opts: PipelineOptions,
  shell: &'a dyn ShellRunner,
  conf: ConfigStore,
}

impl<'a> Pipeline<'a> {
  pub fn new(opts: PipelineOptions, shell: &'a dyn ShellRunner, prompter: Box<dyn Prompter>) -> Self {
    let conf = ConfigStore::load(&opts.config_path, prompter);
    Self { opts, shell, conf }
  }

  pub fn config(&self) -> &ConfigStore {
    &self.conf
  }

  /// Resolve every toggle and instantiate the groups in dependency order.
  pub fn plan(&mut self) -> Result<Plan, PipelineError> {
    let checkout = self.conf.get_bool("CHECKOUT", "Check out source?", true)?;
    let third = self.conf.get_bool("THIRDPARTY", "Build the third-party packages?", true)?;
    let wdss2 = self.conf.get_bool("WDSS2", "Build the WDSS2 severe weather libraries?", true)?;
    let hydro_on = self.conf.get_bool("HYDRO", "Build the MRMS Hydro libraries?", true)?;
    let gui = self
      .conf
      .get_bool_auto("GUI", "Build the WDSS2 display GUI?", || severe::gui_available(self.shell))?;
    let gui2 = self
      .conf
      .get_bool_auto("GUI2", "Build the WG2 display GUI?", || wg2::gui2_available(self.shell))?;

    let (research, python_dev, export) = if wdss2 {
      let research = self.conf.get_bool("RESEARCH", "Research build (keyless)?", false)?;
      let python_dev = self.conf.get_bool_auto("PYTHONDEV", "Enable Python development support?", || {
        severe::python_dev_available(self.shell)
      })?;
      // A research build always exports; only realtime builds get a say.
      let export = research || self.conf.get_bool("EXPORT", "Export-restricted version?", false)?;
      (research, python_dev, export)
    } else {
      (false, false, false)
    };

    let mut groups = vec![
      thirdparty::group(third),
      severe::group(wdss2, gui),
      hydro::group(&mut self.conf, hydro_on)?,
    ];
    if gui2 {
      groups.push(wg2::group(true));
    }

    let jobs = match self.conf.file().setting("JOBS") {
      Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
        warn!(value = raw, "bad JOBS value, using detected parallelism");
        detect_jobs()
      }),
      None => detect_jobs(),
    };
    self.conf.add_history("JOBS", "Make jobs", &jobs.to_string());

    Ok(Plan {
      groups,
      checkout,
      research,
      python_dev,
      export,
      jobs,
    })
  }

  /// Run the whole pipeline. Returns a report on success; any error means
  /// later phases did not run.
  pub fn run(&mut self) -> Result<PipelineReport, PipelineError> {
    let mut plan = self.plan()?;

    gate(&plan.groups, self.shell)?;
    let target = self.resolve_target()?;

    if plan.checkout {
      let credential = self.resolve_credential()?;
      let revision = self.conf.get_string("REVISION", "Revision to check out", "HEAD")?;
      let root = self
        .conf
        .get_string("REPOSITORY", "Repository root", DEFAULT_SVN_ROOT)?;
      let svn = SvnClient::new(root, self.shell);
      checkout_groups(&plan.groups, &svn, &credential, &revision, &target)?;
    } else {
      info!("checkout disabled, building the existing tree");
    }

    let cpp_flags = self.resolve_cpp_flags(&plan, &target);
    let make_flags = format!("--jobs={}", plan.jobs);
    for group in &mut plan.groups {
      group.set_make_flags(&make_flags);
      if group.name() == "wdss2" {
        group.set_cpp_flags(&cpp_flags);
      }
    }

    let built = build_groups(&plan.groups, self.shell, &target)?;

    let host = HostInfo::detect(self.shell);
    let manifest = BuildManifest {
      completed: Local::now(),
      host: &host,
      options: self.conf.history(),
    };
    if let Err(e) = manifest.write(&target) {
      warn!(error = %e, "could not write build manifest");
    }

    Ok(PipelineReport {
      target,
      built,
      options: self.conf.history().to_vec(),
    })
  }

  /// Pick the install target. A `--target` override or `TARGET` config key
  /// wins; otherwise the menu of standard candidates, re-asked until one
  /// proves writable.
  fn resolve_target(&mut self) -> Result<PathBuf, PipelineError> {
    if let Some(path) = self.opts.target_override.clone() {
      if !target::validate(&path) {
        return Err(PipelineError::NoTarget);
      }
      self.conf.add_history("TARGET", "Target location", &path.display().to_string());
      return Ok(path);
    }

    if self.conf.file().setting("TARGET").is_some() {
      let raw = self.conf.get_string("TARGET", "Target location", "")?;
      let path = PathBuf::from(raw);
      if target::validate(&path) {
        return Ok(path);
      }
      return Err(PipelineError::NoTarget);
    }

    let candidates = target::candidate_paths(Local::now().date_naive());
    let options: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    for _ in 0..TARGET_ATTEMPTS {
      let answer = self.conf.choose("Where should the build go?", &options, "1")?;
      let path = match answer.trim().parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => candidates[n - 1].clone(),
        _ => PathBuf::from(answer.trim()),
      };
      if target::validate(&path) {
        self.conf.add_history("TARGET", "Target location", &path.display().to_string());
        return Ok(path);
      }
      warn!(path = %path.display(), "target not usable, asking again");
    }
    Err(PipelineError::NoTarget)
  }

  /// Resolve who checks out. The username defaults to the operator;
  /// `.` means anonymous and skips the password question entirely.
  fn resolve_credential(&mut self) -> Result<Credential, PipelineError> {
    let username = self
      .conf
      .get_string("USERNAME", "SVN username ('.' for anonymous)", &whoami::username())?;
    if username == "." {
      return Ok(Credential::anonymous());
    }
    let password = self.conf.get_password("PASSWORD", "SVN password")?;
    Ok(Credential {
      username,
      password: Some(password),
    })
  }

  /// Merge the config `-D` defines under the checked-out authorization
  /// file's, auth winning, and render the result for the WDSS2 configure.
  /// Nothing consumes the defines when WDSS2 is disabled, so the auth
  /// file is not even looked for then.
  fn resolve_cpp_flags(&self, plan: &Plan, target: &Path) -> String {
    if !plan.groups.iter().any(|g| g.enabled() && g.name() == "wdss2") {
      return String::new();
    }

    let mut ours = flags::dflags_from_config(self.conf.file());
    if plan.python_dev {
      ours.set("PYTHON_DEVEL", "2.7");
    }
    if plan.export {
      ours.set("EXPORT_VERSION", "");
    }

    let auth_path = severe::key_location(target, plan.research);
    let auth = match flags::read_auth_flags(&auth_path) {
      Ok(map) => map,
      Err(e) => {
        warn!(path = %auth_path.display(), error = %e, "no authorization file, using config defines only");
        FlagMap::new()
      }
    };

    flags::render(&flags::merge(&ours, &auth))
  }
}

/// Requirement gate. Every enabled group is probed even after a failure so
/// the operator sees the full list; disabled groups are never touched.
fn gate(groups: &[BuilderGroup], shell: &dyn ShellRunner) -> Result<(), PipelineError> {
  let mut failing = Vec::new();
  for group in groups.iter().filter(|g| g.enabled()) {
    if !group.check_requirements(shell) {
      failing.push(group.name().to_string());
    }
  }
  if failing.is_empty() {
    Ok(())
  } else {
    Err(PipelineError::RequirementsNotMet { groups: failing })
  }
}

/// Check out every enabled group, in order. First failure aborts.
fn checkout_groups(
  groups: &[BuilderGroup],
  vcs: &dyn VcsClient,
  credential: &Credential,
  revision: &str,
  target: &Path,
) -> Result<(), PipelineError> {
  for group in groups.iter().filter(|g| g.enabled()) {
    group
      .checkout(vcs, credential, revision, target)
      .map_err(|source| PipelineError::GroupFailed {
        phase: Phase::Checkout,
        group: group.name().to_string(),
        source,
      })?;
  }
  Ok(())
}

/// Build every enabled group, in order. First failure aborts the rest.
fn build_groups(
  groups: &[BuilderGroup],
  shell: &dyn ShellRunner,
  target: &Path,
) -> Result<Vec<String>, PipelineError> {
  let mut built = Vec::new();
  for group in groups.iter().filter(|g| g.enabled()) {
    info!(group = group.name(), "building group");
    group.build(shell, target).map_err(|source| PipelineError::GroupFailed {
      phase: Phase::Build,
      group: group.name().to_string(),
      source,
    })?;
    built.push(group.name().to_string());
  }
  Ok(built)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builders::testutil::{call_log, CallLog, FakeUnit, RecordingShell, RecordingVcs};
  use crate::config::DefaultAnswers;
  use tempfile::TempDir;

  fn fake_group(name: &'static str, enabled: bool, units: Vec<Box<dyn crate::builders::BuildUnit>>) -> BuilderGroup {
    let mut g = BuilderGroup::new(name, "/fake/trunk", name, units);
    g.set_enabled(enabled);
    g
  }

  fn passing_group(name: &'static str, enabled: bool, log: CallLog) -> BuilderGroup {
    fake_group(name, enabled, vec![FakeUnit::passing(name, log)])
  }

  fn write_config(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("default.cfg");
    std::fs::write(&path, text).unwrap();
    path
  }

  fn pipeline<'a>(config: &Path, shell: &'a RecordingShell, target: Option<PathBuf>) -> Pipeline<'a> {
    Pipeline::new(
      PipelineOptions {
        config_path: config.to_path_buf(),
        target_override: target,
      },
      shell,
      Box::new(DefaultAnswers),
    )
  }

  #[test]
  fn gate_probes_all_enabled_groups_and_lists_failures() {
    let log = call_log();
    let groups = vec![
      fake_group("a", true, vec![FakeUnit::failing_requirements("a1", log.clone())]),
      fake_group("b", true, vec![FakeUnit::passing("b1", log.clone())]),
      fake_group("c", true, vec![FakeUnit::failing_requirements("c1", log.clone())]),
    ];

    let err = gate(&groups, &RecordingShell::default()).unwrap_err();
    let PipelineError::RequirementsNotMet { groups: failing } = err else {
      panic!("expected a gate failure");
    };
    assert_eq!(failing, vec!["a", "c"]);
    assert_eq!(
      *log.borrow(),
      vec!["check:a1", "check:b1", "check:c1"],
      "every enabled group must be probed, not just the first failure"
    );
  }

  #[test]
  fn gate_never_touches_disabled_groups() {
    let log = call_log();
    let groups = vec![
      passing_group("a", true, log.clone()),
      fake_group("b", false, vec![FakeUnit::failing_requirements("b1", log.clone())]),
    ];

    gate(&groups, &RecordingShell::default()).unwrap();
    assert_eq!(*log.borrow(), vec!["check:a"]);
  }

  #[test]
  fn build_runs_enabled_groups_in_declared_order() {
    let log = call_log();
    let groups = vec![
      passing_group("a", true, log.clone()),
      passing_group("b", false, log.clone()),
      passing_group("c", true, log.clone()),
    ];

    let built = build_groups(&groups, &RecordingShell::default(), Path::new("/tmp/MRMS")).unwrap();
    assert_eq!(built, vec!["a", "c"]);
    assert_eq!(*log.borrow(), vec!["build:a", "build:c"]);
  }

  #[test]
  fn build_failure_halts_later_groups() {
    let log = call_log();
    let groups = vec![
      passing_group("a", true, log.clone()),
      fake_group("b", true, vec![FakeUnit::failing_build("b1", log.clone())]),
      passing_group("c", true, log.clone()),
    ];

    let err = build_groups(&groups, &RecordingShell::default(), Path::new("/tmp/MRMS")).unwrap_err();
    let PipelineError::GroupFailed { phase, group, .. } = err else {
      panic!("expected a build failure");
    };
    assert_eq!(phase, Phase::Build);
    assert_eq!(group, "b");
    assert_eq!(*log.borrow(), vec!["build:a", "build:b1"]);
  }

  #[test]
  fn checkout_skips_disabled_and_aborts_on_failure() {
    let groups = vec![
      fake_group("a", true, vec![]),
      fake_group("b", false, vec![]),
      fake_group("c", true, vec![]),
    ];
    let vcs = RecordingVcs::default();

    checkout_groups(&groups, &vcs, &Credential::anonymous(), "HEAD", Path::new("/tmp/MRMS")).unwrap();
    let modules: Vec<_> = vcs.checkouts.borrow().iter().map(|(m, _)| m.clone()).collect();
    assert_eq!(modules.len(), 2, "disabled group must not be checked out");

    let failing = RecordingVcs {
      fail_module: Some("/fake/trunk"),
      ..Default::default()
    };
    let err = checkout_groups(&groups, &failing, &Credential::anonymous(), "HEAD", Path::new("/tmp/MRMS"))
      .unwrap_err();
    assert!(matches!(err, PipelineError::GroupFailed { phase: Phase::Checkout, .. }));
  }

  #[test]
  fn plan_respects_toggles() {
    let temp = TempDir::new().unwrap();
    let config = write_config(
      &temp,
      "[settings]\nCHECKOUT = no\nTHIRDPARTY = yes\nWDSS2 = no\nHYDRO = yes\nGUI = no\nGUI2 = no\nJOBS = 4\n",
    );
    let shell = RecordingShell::default();
    let mut pipeline = pipeline(&config, &shell, None);

    let plan = pipeline.plan().unwrap();
    assert_eq!(plan.enabled_names(), vec!["thirdparty", "hydro"]);
    assert!(!plan.checkout);
    assert_eq!(plan.jobs, 4);
    // WDSS2 is off, so its follow-up questions must not resolve.
    assert!(!pipeline.config().history().iter().any(|e| e.key == "RESEARCH"));
  }

  #[test]
  fn plan_appends_wg2_only_on_request() {
    let temp = TempDir::new().unwrap();
    let with = write_config(
      &temp,
      "[settings]\nCHECKOUT = no\nTHIRDPARTY = no\nWDSS2 = no\nHYDRO = no\nGUI = no\nGUI2 = yes\n",
    );
    let shell = RecordingShell::default();
    let plan = pipeline(&with, &shell, None).plan().unwrap();
    assert_eq!(plan.enabled_names(), vec!["wg2"]);
    assert_eq!(plan.groups.len(), 4);
  }

  #[test]
  fn research_implies_export() {
    let temp = TempDir::new().unwrap();
    let config = write_config(
      &temp,
      "[settings]\nCHECKOUT = no\nTHIRDPARTY = no\nWDSS2 = yes\nHYDRO = no\nGUI = no\nGUI2 = no\nRESEARCH = yes\nPYTHONDEV = no\n",
    );
    let shell = RecordingShell::default();
    let plan = pipeline(&config, &shell, None).plan().unwrap();
    assert!(plan.research);
    assert!(plan.export);
  }

  #[test]
  fn cpp_flags_resolved_only_for_wdss2_runs() {
    let temp = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let auth = target.path().join("WDSS2/auth/realtime.auth");
    std::fs::create_dir_all(auth.parent().unwrap()).unwrap();
    std::fs::write(&auth, "-DBAR=2\n").unwrap();

    let common = "CHECKOUT = no\nTHIRDPARTY = no\nHYDRO = no\nGUI = no\nGUI2 = no\n\
                  RESEARCH = no\nPYTHONDEV = no\nEXPORT = no\n";
    let shell = RecordingShell::default();

    let without = write_config(&temp, &format!("[settings]\nWDSS2 = no\n{common}\n[dflags]\nFOO = 1\n"));
    let mut p = pipeline(&without, &shell, None);
    let plan = p.plan().unwrap();
    assert_eq!(p.resolve_cpp_flags(&plan, target.path()), "", "auth defines must not leak into a non-WDSS2 run");

    let with = write_config(&temp, &format!("[settings]\nWDSS2 = yes\n{common}\n[dflags]\nFOO = 1\n"));
    let mut p = pipeline(&with, &shell, None);
    let plan = p.plan().unwrap();
    assert_eq!(p.resolve_cpp_flags(&plan, target.path()), "-DFOO=1 -DBAR=2");
  }

  #[test]
  fn run_with_everything_disabled_still_writes_manifest() {
    let temp = TempDir::new().unwrap();
    let config = write_config(
      &temp,
      "[settings]\nCHECKOUT = no\nTHIRDPARTY = no\nWDSS2 = no\nHYDRO = no\nGUI = no\nGUI2 = no\nJOBS = 2\n",
    );
    let target = TempDir::new().unwrap();
    let shell = RecordingShell::default();
    let mut pipeline = pipeline(&config, &shell, Some(target.path().to_path_buf()));

    let report = pipeline.run().unwrap();
    assert!(report.built.is_empty());
    assert_eq!(report.target, target.path());
    assert!(target.path().join("bin/VERSION").exists());
    // Only the manifest's OS probe may touch the shell.
    assert_eq!(*shell.commands.borrow(), vec!["cat /etc/redhat-release".to_string()]);
  }

  #[test]
  fn target_config_key_wins() {
    let temp = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let config = write_config(
      &temp,
      &format!(
        "[settings]\nCHECKOUT = no\nTHIRDPARTY = no\nWDSS2 = no\nHYDRO = no\nGUI = no\nGUI2 = no\nTARGET = {}\n",
        target_dir.path().display()
      ),
    );
    let shell = RecordingShell::default();
    let mut p = pipeline(&config, &shell, None);

    let resolved = p.resolve_target().unwrap();
    assert_eq!(resolved, target_dir.path());
    assert!(p.config().history().iter().any(|e| e.key == "TARGET"));
  }

  #[test]
  fn unusable_override_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, "");
    let shell = RecordingShell::default();
    let mut p = pipeline(&config, &shell, Some(PathBuf::from("/proc/no-such-target")));

    assert!(matches!(p.resolve_target(), Err(PipelineError::NoTarget)));
  }
}
