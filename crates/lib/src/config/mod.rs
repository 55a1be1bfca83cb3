//! Persisted build configuration.
//!
//! `file` parses the section-keyed config file format; `store` layers the
//! resolve-or-prompt question store with its answer history on top.

mod file;
mod store;

pub use file::{ConfigFile, ParseIssue};
pub use store::{
  ConfigError, ConfigSource, ConfigStore, DefaultAnswers, HistoryEntry, Prompter, Provenance, Value,
};
