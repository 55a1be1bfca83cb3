//! Implementation of the `mrmsbuild plan` command.
//!
//! Resolves the configuration the way a build would, then prints the
//! groups that would run and the answered options. Nothing touches the
//! filesystem: no gate, no checkout, no build.

use std::path::Path;

use anyhow::Result;

use mrmsbuild_lib::config::{DefaultAnswers, Prompter};
use mrmsbuild_lib::driver::{Pipeline, PipelineOptions};
use mrmsbuild_lib::exec::SystemShell;

use crate::output::{print_error, print_info, print_stat, symbols};
use crate::prompts::TermPrompter;

pub fn cmd_plan(config: &Path, batch: bool) -> Result<()> {
  let shell = SystemShell;
  let prompter: Box<dyn Prompter> = if batch {
    Box::new(DefaultAnswers)
  } else {
    Box::new(TermPrompter)
  };

  let mut pipeline = Pipeline::new(
    PipelineOptions {
      config_path: config.to_path_buf(),
      target_override: None,
    },
    &shell,
    prompter,
  );

  print_info(&pipeline.config().source().to_string());

  let plan = match pipeline.plan() {
    Ok(plan) => plan,
    Err(e) => {
      print_error(&e.to_string());
      std::process::exit(1);
    }
  };

  println!();
  println!("Would build, in order:");
  for name in plan.enabled_names() {
    println!("  {} {}", symbols::ARROW, name);
  }
  if plan.enabled_names().is_empty() {
    println!("  (nothing enabled)");
  }

  println!();
  println!("Options:");
  for entry in pipeline.config().history() {
    print_stat(&entry.key, &format!("{} = {}", entry.label, entry.value));
  }

  Ok(())
}
