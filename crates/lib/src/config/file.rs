//! The config file format.
//!
//! A line-oriented, section-keyed text format:
//!
//! ```text
//! # comment
//! [settings]
//! CHECKOUT = yes
//! TARGET = /data/MRMS
//!
//! [dflags]
//! SENTINEL_VERSION = 2
//! EXPORT_VERSION =
//! ```
//!
//! Keys before the first section header belong to the unnamed section.
//! Section names are matched case-insensitively; entry order within a
//! section is preserved (the `[dflags]` section is order-significant).
//! A malformed line is recorded as a [`ParseIssue`] and skipped; it never
//! fails the whole file.

use std::fs;
use std::path::Path;

use tracing::warn;

/// A line the parser could not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
  pub line: usize,
  pub text: String,
}

#[derive(Debug, Clone, Default)]
struct Section {
  name: String,
  entries: Vec<(String, String)>,
}

/// A parsed config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
  sections: Vec<Section>,
  issues: Vec<ParseIssue>,
}

impl ConfigFile {
  /// Read and parse a config file from disk.
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let text = fs::read_to_string(path)?;
    Ok(Self::parse(&text))
  }

  /// Parse config text. Never fails: bad lines become [`ParseIssue`]s.
  pub fn parse(text: &str) -> Self {
    let mut file = ConfigFile::default();
    let mut current = Section::default();

    for (idx, raw) in text.lines().enumerate() {
      let line = raw.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }

      if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        file.sections.push(std::mem::take(&mut current));
        current.name = name.trim().to_ascii_lowercase();
        continue;
      }

      match line.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
          current
            .entries
            .push((key.trim().to_string(), value.trim().to_string()));
        }
        _ => {
          warn!(line = idx + 1, text = %line, "skipping malformed config line");
          file.issues.push(ParseIssue {
            line: idx + 1,
            text: line.to_string(),
          });
        }
      }
    }

    file.sections.push(current);
    file
  }

  /// Look up `key` in the named section (case-insensitive section name).
  pub fn get(&self, section: &str, key: &str) -> Option<&str> {
    let section = section.to_ascii_lowercase();
    self
      .sections
      .iter()
      .filter(|s| s.name == section)
      .flat_map(|s| s.entries.iter())
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  /// Look up a settings key: `[settings]` first, then the unnamed section.
  pub fn setting(&self, key: &str) -> Option<&str> {
    self.get("settings", key).or_else(|| self.get("", key))
  }

  /// All entries of a section, in file order.
  pub fn section_entries(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
    let section = section.to_ascii_lowercase();
    self
      .sections
      .iter()
      .filter(move |s| s.name == section)
      .flat_map(|s| s.entries.iter())
      .map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Lines the parser skipped.
  pub fn issues(&self) -> &[ParseIssue] {
    &self.issues
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
# build answers
TOPLEVEL = 1

[settings]
CHECKOUT = yes
TARGET = /data/MRMS
EMPTY =

[dflags]
SENTINEL_VERSION = 2
EXPORT_VERSION =
"#;

  #[test]
  fn settings_lookup() {
    let file = ConfigFile::parse(SAMPLE);
    assert_eq!(file.setting("CHECKOUT"), Some("yes"));
    assert_eq!(file.setting("TARGET"), Some("/data/MRMS"));
    assert_eq!(file.setting("MISSING"), None);
  }

  #[test]
  fn unnamed_section_fallback() {
    let file = ConfigFile::parse(SAMPLE);
    assert_eq!(file.setting("TOPLEVEL"), Some("1"));
  }

  #[test]
  fn empty_value_is_kept() {
    let file = ConfigFile::parse(SAMPLE);
    assert_eq!(file.setting("EMPTY"), Some(""));
  }

  #[test]
  fn section_order_preserved() {
    let file = ConfigFile::parse(SAMPLE);
    let dflags: Vec<_> = file.section_entries("dflags").collect();
    assert_eq!(dflags, vec![("SENTINEL_VERSION", "2"), ("EXPORT_VERSION", "")]);
  }

  #[test]
  fn section_names_case_insensitive() {
    let file = ConfigFile::parse("[Settings]\nA = 1\n");
    assert_eq!(file.setting("A"), Some("1"));
    assert_eq!(file.get("SETTINGS", "A"), Some("1"));
  }

  #[test]
  fn malformed_line_is_an_issue_not_an_error() {
    let file = ConfigFile::parse("[settings]\nGOOD = 1\nthis is not a pair\n");
    assert_eq!(file.setting("GOOD"), Some("1"));
    assert_eq!(file.issues().len(), 1);
    assert_eq!(file.issues()[0].line, 3);
  }

  #[test]
  fn comments_and_blanks_ignored() {
    let file = ConfigFile::parse("\n# note\n\n[settings]\n# another\nK = v\n");
    assert_eq!(file.setting("K"), Some("v"));
    assert!(file.issues().is_empty());
  }

  #[test]
  fn load_missing_file_errors() {
    let result = ConfigFile::load(Path::new("/nonexistent/default.cfg"));
    assert!(result.is_err());
  }
}
