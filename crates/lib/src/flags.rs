//! Compiler-define flag maps.
//!
//! WDSS2 builds take their `-D` defines from two places: the `[dflags]`
//! section of the config file, and the authorization file checked out with
//! the source. The two are merged with the authorization file winning, and
//! the result is rendered into a single CPPFLAGS-style string.

use std::path::Path;

use tracing::debug;

/// An ordered mapping from define name to value. An empty value means a
/// bare define (`-DNAME`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagMap {
  entries: Vec<(String, String)>,
}

impl FlagMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a flag, replacing an existing entry in place.
  pub fn set(&mut self, name: &str, value: &str) {
    match self.entries.iter_mut().find(|(n, _)| n == name) {
      Some(entry) => entry.1 = value.to_string(),
      None => self.entries.push((name.to_string(), value.to_string())),
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
  }
}

impl FromIterator<(String, String)> for FlagMap {
  fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
    let mut map = FlagMap::new();
    for (n, v) in iter {
      map.set(&n, &v);
    }
    map
  }
}

/// Merge two flag maps. For a key in both, `over` wins. Output order is the
/// base-only keys in base order, then `over`'s keys in override order.
pub fn merge(base: &FlagMap, over: &FlagMap) -> FlagMap {
  let mut out = FlagMap::new();
  for (name, value) in base.iter() {
    if !over.contains(name) {
      out.set(name, value);
    }
  }
  for (name, value) in over.iter() {
    out.set(name, value);
  }
  out
}

/// Render a flag map as one `-D` token per entry, space-separated.
/// An empty map renders to the empty string.
pub fn render(map: &FlagMap) -> String {
  map
    .iter()
    .map(|(name, value)| {
      if value.is_empty() {
        format!("-D{}", name)
      } else {
        format!("-D{}={}", name, value)
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Recover the `-D` entries from flag text. Tokens that are not defines are
/// ignored, so this also digests CXXFLAGS-style authorization lines.
pub fn parse(text: &str) -> FlagMap {
  let mut map = FlagMap::new();
  for token in text.split_whitespace() {
    if let Some(def) = token.strip_prefix("-D") {
      if def.is_empty() {
        continue;
      }
      match def.split_once('=') {
        Some((name, value)) => map.set(name, value),
        None => map.set(def, ""),
      }
    }
  }
  map
}

/// The `-D` entries found in an authorization file, in file order.
pub fn read_auth_flags(path: &Path) -> Result<FlagMap, std::io::Error> {
  let text = std::fs::read_to_string(path)?;
  let map = parse(&text);
  debug!(path = %path.display(), count = map.len(), "read auth file defines");
  Ok(map)
}

/// The `[dflags]` section of the config file, in declaration order.
pub fn dflags_from_config(file: &crate::config::ConfigFile) -> FlagMap {
  let mut map = FlagMap::new();
  for (name, value) in file.section_entries("dflags") {
    map.set(name, value);
  }
  map
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ConfigFile;

  fn map(pairs: &[(&str, &str)]) -> FlagMap {
    pairs
      .iter()
      .map(|(n, v)| (n.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn override_wins_for_shared_keys() {
    let base = map(&[("A", "1"), ("B", "2")]);
    let over = map(&[("B", "9"), ("C", "3")]);
    let merged = merge(&base, &over);

    assert_eq!(merged.get("A"), Some("1"));
    assert_eq!(merged.get("B"), Some("9"));
    assert_eq!(merged.get("C"), Some("3"));
  }

  #[test]
  fn merge_order_is_base_unique_then_override() {
    let base = map(&[("A", "1"), ("B", "2"), ("D", "4")]);
    let over = map(&[("C", "3"), ("B", "9")]);
    let merged = merge(&base, &over);

    let names: Vec<_> = merged.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["A", "D", "C", "B"]);
  }

  #[test]
  fn merge_with_empty_sides() {
    let base = map(&[("A", "1")]);
    assert_eq!(merge(&base, &FlagMap::new()), base);
    assert_eq!(merge(&FlagMap::new(), &base), base);
  }

  #[test]
  fn render_bare_and_valued() {
    let flags = map(&[("PYTHON_DEVEL", "2.7"), ("EXPORT_VERSION", "")]);
    assert_eq!(render(&flags), "-DPYTHON_DEVEL=2.7 -DEXPORT_VERSION");
  }

  #[test]
  fn render_empty_map() {
    assert_eq!(render(&FlagMap::new()), "");
  }

  #[test]
  fn parse_ignores_non_defines() {
    let flags = parse("-O2 -Wall -DFOO=bar -I/usr/include -DBARE");
    assert_eq!(flags.get("FOO"), Some("bar"));
    assert_eq!(flags.get("BARE"), Some(""));
    assert_eq!(flags.len(), 2);
  }

  #[test]
  fn render_parse_round_trip() {
    let flags = map(&[("A", "1"), ("EXPORT_VERSION", ""), ("B", "x=y")]);
    let recovered = parse(&render(&flags));
    // Same key/value set; order happens to be preserved too.
    assert_eq!(recovered, flags);
  }

  #[test]
  fn set_replaces_in_place() {
    let mut flags = map(&[("A", "1"), ("B", "2")]);
    flags.set("A", "7");
    let names: Vec<_> = flags.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(flags.get("A"), Some("7"));
  }

  #[test]
  fn dflags_read_in_declaration_order() {
    let file = ConfigFile::parse("[dflags]\nZ_LAST = 1\nA_FIRST = 2\n");
    let flags = dflags_from_config(&file);
    let names: Vec<_> = flags.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["Z_LAST", "A_FIRST"]);
  }

  #[test]
  fn auth_file_defines() {
    let temp = tempfile::TempDir::new().unwrap();
    let auth = temp.path().join("realtime.auth");
    std::fs::write(&auth, "CXXFLAGS = -O2 -DSENTINEL_KEY=abc123 -DREALTIME\n").unwrap();

    let flags = read_auth_flags(&auth).unwrap();
    assert_eq!(flags.get("SENTINEL_KEY"), Some("abc123"));
    assert_eq!(flags.get("REALTIME"), Some(""));
  }
}
