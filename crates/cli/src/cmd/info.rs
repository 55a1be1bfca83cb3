//! Implementation of the `mrmsbuild info` command.

use anyhow::Result;

use mrmsbuild_lib::consts::{TOOL_NAME, version};
use mrmsbuild_lib::exec::SystemShell;
use mrmsbuild_lib::platform::{HostInfo, detect_jobs};

use crate::output::{print_json, print_stat};

pub fn cmd_info(json: bool) -> Result<()> {
  let host = HostInfo::detect(&SystemShell);
  let jobs = detect_jobs();

  if json {
    print_json(&serde_json::json!({
      "tool": TOOL_NAME,
      "version": version(),
      "host": host,
      "jobs": jobs,
    }))?;
  } else {
    println!("{} version {}", TOOL_NAME, version());
    print_stat("Operator", &host.username);
    print_stat("Host", &host.hostname);
    print_stat("OS", &host.os_description);
    print_stat("Jobs", &jobs.to_string());
  }

  Ok(())
}
