//! The question store.
//!
//! Every decision the builder makes is phrased as a keyed question. The
//! store answers it from the config file when it can, otherwise through the
//! injected [`Prompter`], and records every resolution exactly once in a
//! history that later becomes part of the build manifest.
//!
//! Within one run a key resolves at most once: asking again returns the
//! cached value without prompting.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::file::ConfigFile;

/// Errors from resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The prompt provider could not deliver an answer.
  #[error("prompt failed: {0}")]
  Prompt(#[from] io::Error),

  /// A value could not be coerced to the requested type.
  #[error("malformed value '{value}' for key '{key}'")]
  Malformed { key: String, value: String },

  /// Interactive input was needed but no terminal is attached.
  #[error("cannot prompt for '{0}' in non-interactive mode (use --batch)")]
  NonInteractive(String),
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Loaded from the config file.
  File,
  /// Answered through the prompter.
  User,
  /// A detector's suggestion, accepted unchanged.
  Auto,
  /// Registered by the builder itself, never asked.
  Computed,
}

/// A resolved configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Bool(bool),
  Text(String),
  Secret(String),
}

impl Value {
  /// The form recorded in history and printed in the manifest. Secrets are
  /// redacted here; the plaintext never leaves [`ConfigStore::secret`].
  pub fn display(&self) -> String {
    match self {
      Value::Bool(true) => "yes".to_string(),
      Value::Bool(false) => "no".to_string(),
      Value::Text(s) => s.clone(),
      Value::Secret(_) => "(hidden)".to_string(),
    }
  }
}

/// One line of the answer history, in resolution order.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
  pub key: String,
  pub label: String,
  /// Already-redacted display form.
  pub value: String,
  pub provenance: Provenance,
}

/// How the backing config file was (or was not) loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
  Loaded(PathBuf),
  Missing(PathBuf),
  Unreadable(PathBuf, String),
}

impl std::fmt::Display for ConfigSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ConfigSource::Loaded(p) => write!(f, "loaded {}", p.display()),
      ConfigSource::Missing(p) => write!(f, "{} not found, using defaults", p.display()),
      ConfigSource::Unreadable(p, e) => write!(f, "{} unreadable ({}), using defaults", p.display(), e),
    }
  }
}

/// Answer provider for questions the config file does not settle.
pub trait Prompter {
  /// Yes/no question. `context` is the key being asked, for diagnostics.
  fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, ConfigError>;

  /// Free-text question; an empty answer means `default`.
  fn input(&mut self, prompt: &str, default: &str) -> Result<String, ConfigError>;

  /// Secret question; the answer must never be echoed into history.
  fn password(&mut self, prompt: &str) -> Result<String, ConfigError>;

  /// Menu pick: returns the raw answer (a digit choosing an option, or
  /// free text). An empty answer means `default`.
  fn choose(&mut self, prompt: &str, options: &[String], default: &str) -> Result<String, ConfigError>;
}

/// A [`Prompter`] that takes the default for every question. Used for
/// `--batch` runs and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnswers;

impl Prompter for DefaultAnswers {
  fn confirm(&mut self, _prompt: &str, default: bool) -> Result<bool, ConfigError> {
    Ok(default)
  }

  fn input(&mut self, _prompt: &str, default: &str) -> Result<String, ConfigError> {
    Ok(default.to_string())
  }

  fn password(&mut self, prompt: &str) -> Result<String, ConfigError> {
    Err(ConfigError::NonInteractive(prompt.to_string()))
  }

  fn choose(&mut self, _prompt: &str, _options: &[String], default: &str) -> Result<String, ConfigError> {
    Ok(default.to_string())
  }
}

/// Coerce a config file string to a boolean.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "yes" | "y" | "true" | "1" => Ok(true),
    "no" | "n" | "false" | "0" => Ok(false),
    _ => Err(ConfigError::Malformed {
      key: key.to_string(),
      value: value.to_string(),
    }),
  }
}

/// The store itself: file values, resolved values, ordered history.
pub struct ConfigStore {
  file: ConfigFile,
  source: ConfigSource,
  resolved: BTreeMap<String, Value>,
  history: Vec<HistoryEntry>,
  prompter: Box<dyn Prompter>,
}

impl ConfigStore {
  /// An empty store (no config file).
  pub fn new(prompter: Box<dyn Prompter>) -> Self {
    Self {
      file: ConfigFile::default(),
      source: ConfigSource::Missing(PathBuf::new()),
      resolved: BTreeMap::new(),
      history: Vec::new(),
      prompter,
    }
  }

  /// Load a store from a config file. A missing or unreadable file is a
  /// soft failure: the store starts empty and the reason is reported
  /// through [`ConfigStore::source`].
  pub fn load(path: &Path, prompter: Box<dyn Prompter>) -> Self {
    let (file, source) = match ConfigFile::load(path) {
      Ok(file) => (file, ConfigSource::Loaded(path.to_path_buf())),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        warn!(path = %path.display(), "config file not found, starting empty");
        (ConfigFile::default(), ConfigSource::Missing(path.to_path_buf()))
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "config file unreadable, starting empty");
        (
          ConfigFile::default(),
          ConfigSource::Unreadable(path.to_path_buf(), e.to_string()),
        )
      }
    };

    Self {
      file,
      source,
      resolved: BTreeMap::new(),
      history: Vec::new(),
      prompter,
    }
  }

  pub fn source(&self) -> &ConfigSource {
    &self.source
  }

  /// The parsed config file, for order-significant sections like `[dflags]`.
  pub fn file(&self) -> &ConfigFile {
    &self.file
  }

  fn record(&mut self, key: &str, label: &str, value: Value, provenance: Provenance) {
    // First resolution wins; history gets exactly one entry per key.
    if self.resolved.contains_key(key) {
      return;
    }
    self.history.push(HistoryEntry {
      key: key.to_string(),
      label: label.to_string(),
      value: value.display(),
      provenance,
    });
    self.resolved.insert(key.to_string(), value);
  }

  /// A key keeps the type of its first resolution; asking again with a
  /// different getter is a caller bug, reported rather than re-prompted.
  fn mismatch(key: &str, cached: &Value) -> ConfigError {
    ConfigError::Malformed {
      key: key.to_string(),
      value: cached.display(),
    }
  }

  /// Yes/no question.
  pub fn get_bool(&mut self, key: &str, prompt: &str, default: bool) -> Result<bool, ConfigError> {
    if let Some(cached) = self.resolved.get(key) {
      return match cached {
        Value::Bool(b) => Ok(*b),
        other => Err(Self::mismatch(key, other)),
      };
    }

    if let Some(raw) = self.file.setting(key).map(str::to_string) {
      match parse_bool(key, &raw) {
        Ok(b) => {
          self.record(key, prompt, Value::Bool(b), Provenance::File);
          return Ok(b);
        }
        Err(e) => warn!(key, value = %raw, error = %e, "bad config value, asking instead"),
      }
    }

    let answer = self.prompter.confirm(prompt, default)?;
    self.record(key, prompt, Value::Bool(answer), Provenance::User);
    Ok(answer)
  }

  /// Yes/no question whose default comes from a probe when the config file
  /// is silent (e.g. "is the toolchain installed").
  pub fn get_bool_auto(
    &mut self,
    key: &str,
    prompt: &str,
    detector: impl FnOnce() -> bool,
  ) -> Result<bool, ConfigError> {
    if let Some(cached) = self.resolved.get(key) {
      return match cached {
        Value::Bool(b) => Ok(*b),
        other => Err(Self::mismatch(key, other)),
      };
    }

    if let Some(raw) = self.file.setting(key).map(str::to_string) {
      match parse_bool(key, &raw) {
        Ok(b) => {
          self.record(key, prompt, Value::Bool(b), Provenance::File);
          return Ok(b);
        }
        Err(e) => warn!(key, value = %raw, error = %e, "bad config value, asking instead"),
      }
    }

    let detected = detector();
    let answer = self.prompter.confirm(prompt, detected)?;
    let provenance = if answer == detected { Provenance::Auto } else { Provenance::User };
    self.record(key, prompt, Value::Bool(answer), provenance);
    Ok(answer)
  }

  /// Free-text question.
  pub fn get_string(&mut self, key: &str, prompt: &str, default: &str) -> Result<String, ConfigError> {
    if let Some(cached) = self.resolved.get(key) {
      return match cached {
        Value::Text(s) => Ok(s.clone()),
        other => Err(Self::mismatch(key, other)),
      };
    }

    if let Some(raw) = self.file.setting(key).map(str::to_string) {
      self.record(key, prompt, Value::Text(raw.clone()), Provenance::File);
      return Ok(raw);
    }

    let answer = self.prompter.input(prompt, default)?;
    self.record(key, prompt, Value::Text(answer.clone()), Provenance::User);
    Ok(answer)
  }

  /// Secret question. History records the entry redacted; the plaintext is
  /// only reachable through the returned value.
  pub fn get_password(&mut self, key: &str, prompt: &str) -> Result<String, ConfigError> {
    if let Some(cached) = self.resolved.get(key) {
      return match cached {
        Value::Secret(s) => Ok(s.clone()),
        other => Err(Self::mismatch(key, other)),
      };
    }

    if let Some(raw) = self.file.setting(key).map(str::to_string) {
      self.record(key, prompt, Value::Secret(raw.clone()), Provenance::File);
      return Ok(raw);
    }

    let answer = self.prompter.password(prompt)?;
    self.record(key, prompt, Value::Secret(answer.clone()), Provenance::User);
    Ok(answer)
  }

  /// Register a value the builder computed rather than asked for, so it
  /// still shows up in the history.
  pub fn add_history(&mut self, key: &str, label: &str, value: &str) {
    self.record(key, label, Value::Text(value.to_string()), Provenance::Computed);
  }

  /// Menu pick, delegated to the prompter. Not cached: callers validate the
  /// answer and re-ask on their own terms.
  pub fn choose(&mut self, prompt: &str, options: &[String], default: &str) -> Result<String, ConfigError> {
    self.prompter.choose(prompt, options, default)
  }

  /// All recorded entries, in first-resolution order.
  pub fn history(&self) -> &[HistoryEntry] {
    &self.history
  }

  /// Write the history human-readably to a sink.
  pub fn write_history(&self, w: &mut dyn io::Write) -> io::Result<()> {
    for entry in &self.history {
      writeln!(w, "\t{}: {} = {}", entry.key, entry.label, entry.value)?;
    }
    Ok(())
  }
}
