//! Implementation of the `mrmsbuild build` command.
//!
//! Wires the terminal prompter and the real shell into the pipeline, runs
//! it end to end and prints the answer history and a summary.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

use mrmsbuild_lib::config::{DefaultAnswers, Prompter};
use mrmsbuild_lib::consts::{TOOL_NAME, version};
use mrmsbuild_lib::driver::{Pipeline, PipelineError, PipelineOptions};
use mrmsbuild_lib::exec::SystemShell;
use mrmsbuild_lib::platform::HostInfo;

use crate::output::{print_error, print_info, print_stat, print_success, print_warning, symbols};
use crate::prompts::TermPrompter;

pub fn cmd_build(config: &Path, batch: bool, target: Option<PathBuf>) -> Result<()> {
  let start = Instant::now();
  info!(config = %config.display(), batch, "starting build");
  let shell = SystemShell;
  let host = HostInfo::detect(&shell);

  let prompter: Box<dyn Prompter> = if batch {
    Box::new(DefaultAnswers)
  } else {
    Box::new(TermPrompter)
  };

  let mut pipeline = Pipeline::new(
    PipelineOptions {
      config_path: config.to_path_buf(),
      target_override: target,
    },
    &shell,
    prompter,
  );

  print_info(&format!("{} version {}", TOOL_NAME, version()));
  print_stat("Config", &pipeline.config().source().to_string());
  print_stat("Operator", &format!("{}@{}", host.username, host.hostname));
  print_stat("OS", &host.os_description);
  for issue in pipeline.config().file().issues() {
    print_warning(&format!("config line {} skipped: {}", issue.line, issue.text));
  }
  println!();

  let report = match pipeline.run() {
    Ok(report) => report,
    Err(PipelineError::RequirementsNotMet { groups }) => {
      print_error(&format!("missing requirements for: {}", groups.join(", ")));
      print_error("nothing was checked out or built");
      std::process::exit(1);
    }
    Err(e) => {
      print_error(&e.to_string());
      std::process::exit(1);
    }
  };

  println!("Options:");
  for entry in &report.options {
    print_stat(&entry.key, &format!("{} = {}", entry.label, entry.value));
  }
  println!();

  for group in &report.built {
    println!("  {} {}", symbols::ARROW, group);
  }

  let elapsed = Duration::from_secs(start.elapsed().as_secs());
  print_success(&format!(
    "Build finished into {} in {}",
    report.target.display(),
    humantime::format_duration(elapsed)
  ));

  Ok(())
}
