//! Terminal question provider.
//!
//! Implements the library's `Prompter` over stdin/stderr. Prompts go to
//! stderr so stdout stays clean for redirection. When no terminal is
//! attached every question fails with the non-interactive error, which the
//! commands turn into a hint to use `--batch`.

use std::io::{self, IsTerminal, Write};

use mrmsbuild_lib::config::{ConfigError, Prompter};

pub struct TermPrompter;

impl TermPrompter {
  fn read_answer(&self, prompt: &str) -> Result<String, ConfigError> {
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
      return Err(ConfigError::NonInteractive(prompt.to_string()));
    }
    write!(io::stderr(), "{} ", prompt).map_err(ConfigError::Prompt)?;
    io::stderr().flush().map_err(ConfigError::Prompt)?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(ConfigError::Prompt)?;
    Ok(input.trim().to_string())
  }
}

impl Prompter for TermPrompter {
  fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, ConfigError> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
      let answer = self.read_answer(&format!("{} {}", prompt, hint))?;
      match answer.to_ascii_lowercase().as_str() {
        "" => return Ok(default),
        "y" | "yes" => return Ok(true),
        "n" | "no" => return Ok(false),
        _ => eprintln!("Please answer y or n."),
      }
    }
  }

  fn input(&mut self, prompt: &str, default: &str) -> Result<String, ConfigError> {
    let answer = self.read_answer(&format!("{} [{}]:", prompt, default))?;
    if answer.is_empty() {
      Ok(default.to_string())
    } else {
      Ok(answer)
    }
  }

  fn password(&mut self, prompt: &str) -> Result<String, ConfigError> {
    // Read like any other answer; the store redacts it everywhere it is
    // recorded, so the value only ever reaches the checkout command.
    self.read_answer(&format!("{}:", prompt))
  }

  fn choose(&mut self, prompt: &str, options: &[String], default: &str) -> Result<String, ConfigError> {
    for (i, option) in options.iter().enumerate() {
      eprintln!("  {}. {}", i + 1, option);
    }
    let answer = self.read_answer(&format!("{} [{}]:", prompt, default))?;
    if answer.is_empty() {
      Ok(default.to_string())
    } else {
      Ok(answer)
    }
  }
}
