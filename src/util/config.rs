//! Layered `(section, subsection, key) -> value` configuration.
//!
//! The on-disk format is the one used by `~/.config/qi/toolchain.cfg`:
//!
//! ```text
//! [toolchain "linux"]
//! provide = foo bar
//!
//! [package "foo"]
//! depends = bar
//! ```
//!
//! Values are plain strings; list values are whitespace separated and split
//! by the caller. A plain `[section]` header has an empty subsection.
//!
//! A [`ConfigStore`] is an in-memory snapshot built from one or more files
//! (later files override earlier ones). Writes never go through the
//! snapshot: [`update_config`] re-reads the file, changes one key and
//! rewrites the whole file, so a live snapshot does not see its own writes
//! until it is re-read.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::core::error::{Result, ToolchainError};
use crate::util::store::StateStore;

/// `(section, subsection, key)`.
type ConfigKey = (String, String, String);

/// In-memory configuration snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: HashMap<ConfigKey, String>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` into the store as a new layer.
    ///
    /// A missing file is an empty layer. Keys present in `path` replace
    /// keys loaded earlier.
    pub fn read(&mut self, store: &dyn StateStore, path: &Path) -> Result<()> {
        let Some(contents) = store.read(path)? else {
            tracing::debug!("no config at {}, using empty layer", path.display());
            return Ok(());
        };
        let doc = ConfigDocument::parse(&contents, path)?;
        for (section, subsection, key, value) in doc.entries() {
            self.values.insert(
                (section.to_string(), subsection.to_string(), key.to_string()),
                value.to_string(),
            );
        }
        Ok(())
    }

    /// Build a store from a single file.
    pub fn load(store: &dyn StateStore, path: &Path) -> Result<Self> {
        let mut config = Self::new();
        config.read(store, path)?;
        Ok(config)
    }

    /// Look up a value.
    pub fn get(&self, section: &str, subsection: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(section.to_string(), subsection.to_string(), key.to_string()))
            .map(String::as_str)
    }

    /// Look up a value, falling back to `default` when absent.
    pub fn get_or<'a>(
        &'a self,
        section: &str,
        subsection: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get(section, subsection, key).unwrap_or(default)
    }

    /// Look up a whitespace separated list. Absent keys give an empty list.
    pub fn get_list(&self, section: &str, subsection: &str, key: &str) -> Vec<String> {
        self.get_or(section, subsection, key, "")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Set `section.subsection.key = value` in the file at `path`.
///
/// Re-reads the file, applies the single change and rewrites it in full.
/// Comments, ordering and unrelated sections are preserved. The file is
/// created if missing.
pub fn update_config(
    store: &dyn StateStore,
    path: &Path,
    section: &str,
    subsection: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    modify_config(store, path, section, subsection, key, |_| {
        Some(value.to_string())
    })
}

/// Compute a new value for one key from its current on-disk value.
///
/// `f` sees the value as currently stored in the file (not in any
/// snapshot) and returns the replacement, or `None` to leave the file as
/// it is. Read and write happen under the store's update lock.
pub fn modify_config<'a, F>(
    store: &dyn StateStore,
    path: &'a Path,
    section: &'a str,
    subsection: &'a str,
    key: &'a str,
    f: F,
) -> Result<()>
where
    F: FnOnce(Option<&str>) -> Option<String> + 'a,
{
    store.update(
        path,
        Box::new(move |current| {
            let mut doc = match &current {
                Some(contents) => ConfigDocument::parse(contents, path)?,
                None => ConfigDocument::default(),
            };
            let Some(value) = f(doc.get(section, subsection, key)) else {
                return Ok(current.unwrap_or_default());
            };
            tracing::debug!(
                "updating {}: [{} \"{}\"] {} = {}",
                path.display(),
                section,
                subsection,
                key,
                value
            );
            doc.set(section, subsection, key, &value);
            Ok(doc.render())
        }),
    )
}

/// A line of a config file, kept verbatim unless it is an entry we rewrite.
#[derive(Debug, Clone)]
enum Line {
    Raw(String),
    Entry { key: String, value: String },
}

#[derive(Debug, Clone)]
struct Section {
    name: String,
    subsection: String,
    /// Header as written, re-emitted unchanged.
    header: String,
    lines: Vec<Line>,
}

/// Order-preserving parse of a config file.
#[derive(Debug, Clone, Default)]
struct ConfigDocument {
    /// Lines before the first header.
    preamble: Vec<Line>,
    sections: Vec<Section>,
}

impl ConfigDocument {
    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut doc = ConfigDocument::default();

        for (idx, raw) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();
            let err = |message: &str| ToolchainError::ConfigRead {
                path: path.to_path_buf(),
                line: line_no,
                message: message.to_string(),
            };

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                doc.current_lines().push(Line::Raw(raw.to_string()));
                continue;
            }

            if let Some(inner) = trimmed.strip_prefix('[') {
                let inner = inner
                    .strip_suffix(']')
                    .ok_or_else(|| err("unterminated section header"))?;
                let (name, subsection) = parse_header(inner).map_err(|m| err(m))?;
                doc.sections.push(Section {
                    name,
                    subsection,
                    header: raw.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| err("expected `key = value`"))?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(err("invalid key"));
            }
            if doc.sections.is_empty() {
                return Err(err("entry outside of any section"));
            }
            doc.current_lines().push(Line::Entry {
                key: key.to_string(),
                value: value.trim().to_string(),
            });
        }

        Ok(doc)
    }

    fn current_lines(&mut self) -> &mut Vec<Line> {
        match self.sections.last_mut() {
            Some(section) => &mut section.lines,
            None => &mut self.preamble,
        }
    }

    /// All entries in file order. Duplicate keys: the last one wins.
    fn entries(&self) -> impl Iterator<Item = (&str, &str, &str, &str)> {
        self.sections.iter().flat_map(|s| {
            s.lines.iter().filter_map(move |line| match line {
                Line::Entry { key, value } => {
                    Some((s.name.as_str(), s.subsection.as_str(), key.as_str(), value.as_str()))
                }
                Line::Raw(_) => None,
            })
        })
    }

    fn get(&self, section: &str, subsection: &str, key: &str) -> Option<&str> {
        self.entries()
            .filter(|(s, sub, k, _)| *s == section && *sub == subsection && *k == key)
            .last()
            .map(|(_, _, _, v)| v)
    }

    fn set(&mut self, section: &str, subsection: &str, key: &str, value: &str) {
        // Update the last occurrence, as that is the one readers see.
        for s in self
            .sections
            .iter_mut()
            .rev()
            .filter(|s| s.name == section && s.subsection == subsection)
        {
            for line in s.lines.iter_mut().rev() {
                if let Line::Entry { key: k, value: v } = line {
                    if k == key {
                        *v = value.to_string();
                        return;
                    }
                }
            }
        }

        let entry = Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        };

        if let Some(s) = self
            .sections
            .iter_mut()
            .rev()
            .find(|s| s.name == section && s.subsection == subsection)
        {
            // Keep trailing blank lines after the new entry.
            let pos = s
                .lines
                .iter()
                .rposition(|l| !matches!(l, Line::Raw(r) if r.trim().is_empty()))
                .map_or(0, |p| p + 1);
            s.lines.insert(pos, entry);
            return;
        }

        let needs_blank = match self.sections.last() {
            Some(last) => !matches!(last.lines.last(), Some(Line::Raw(r)) if r.trim().is_empty()),
            None => self.preamble.iter().any(|l| !matches!(l, Line::Raw(r) if r.trim().is_empty())),
        };
        if needs_blank {
            self.current_lines().push(Line::Raw(String::new()));
        }

        self.sections.push(Section {
            name: section.to_string(),
            subsection: subsection.to_string(),
            header: format_header(section, subsection),
            lines: vec![entry],
        });
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let mut push = |line: &Line| match line {
            Line::Raw(raw) => {
                let _ = writeln!(out, "{}", raw);
            }
            Line::Entry { key, value } => {
                let _ = writeln!(out, "{} = {}", key, value);
            }
        };
        for line in &self.preamble {
            push(line);
        }
        for section in &self.sections {
            push(&Line::Raw(section.header.clone()));
            for line in &section.lines {
                push(line);
            }
        }
        out
    }
}

/// Parse `toolchain "linux"` or `core` (without brackets).
fn parse_header(inner: &str) -> std::result::Result<(String, String), &'static str> {
    let inner = inner.trim();
    let (name, rest) = match inner.find(char::is_whitespace) {
        Some(pos) => (&inner[..pos], inner[pos..].trim()),
        None => (inner, ""),
    };
    if name.is_empty() {
        return Err("empty section name");
    }
    if rest.is_empty() {
        return Ok((name.to_string(), String::new()));
    }
    let subsection = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or("subsection must be double-quoted")?;
    if subsection.contains('"') {
        return Err("subsection must be double-quoted");
    }
    Ok((name.to_string(), subsection.to_string()))
}

fn format_header(section: &str, subsection: &str) -> String {
    if subsection.is_empty() {
        format!("[{}]", section)
    } else {
        format!("[{} \"{}\"]", section, subsection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::store::{FsStore, MemoryStore};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# qitoolchain configuration
[toolchain "linux"]
provide = foo bar

[package "foo"]
depends = bar baz
"#;

    #[test]
    fn test_missing_file_is_empty() {
        let store = MemoryStore::new();
        let config = ConfigStore::load(&store, Path::new("/nope.cfg")).unwrap();
        assert!(config.is_empty());
        assert_eq!(config.get("toolchain", "linux", "provide"), None);
        assert_eq!(config.get_or("toolchain", "linux", "provide", "x"), "x");
    }

    #[test]
    fn test_get_and_lists() {
        let store = MemoryStore::new();
        let path = Path::new("/cfg/toolchain.cfg");
        store.insert(path, SAMPLE);

        let config = ConfigStore::load(&store, path).unwrap();
        assert_eq!(config.get("toolchain", "linux", "provide"), Some("foo bar"));
        assert_eq!(config.get_list("package", "foo", "depends"), vec!["bar", "baz"]);
        assert!(config.get_list("package", "bar", "depends").is_empty());
    }

    #[test]
    fn test_layers_override() {
        let store = MemoryStore::new();
        let global = Path::new("/global.cfg");
        let local = Path::new("/local.cfg");
        store.insert(global, "[toolchain \"linux\"]\nprovide = foo\n[build]\njobs = 4\n");
        store.insert(local, "[toolchain \"linux\"]\nprovide = foo bar\n");

        let mut config = ConfigStore::new();
        config.read(&store, global).unwrap();
        config.read(&store, local).unwrap();

        assert_eq!(config.get("toolchain", "linux", "provide"), Some("foo bar"));
        assert_eq!(config.get("build", "", "jobs"), Some("4"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let store = MemoryStore::new();
        let path = Path::new("/bad.cfg");
        store.insert(path, "[toolchain \"linux\"]\nprovide foo\n");

        let err = ConfigStore::load(&store, path).unwrap_err();
        match err {
            ToolchainError::ConfigRead { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }

        store.insert(path, "[toolchain linux]\n");
        assert!(ConfigStore::load(&store, path).is_err());

        store.insert(path, "provide = foo\n");
        assert!(ConfigStore::load(&store, path).is_err());
    }

    #[test]
    fn test_update_creates_file() {
        let store = MemoryStore::new();
        let path = Path::new("/cfg/toolchain.cfg");

        update_config(&store, path, "toolchain", "linux", "provide", "foo").unwrap();
        assert_eq!(
            store.read(path).unwrap().unwrap(),
            "[toolchain \"linux\"]\nprovide = foo\n"
        );

        update_config(&store, path, "package", "foo", "depends", "bar").unwrap();
        assert_eq!(
            store.read(path).unwrap().unwrap(),
            "[toolchain \"linux\"]\nprovide = foo\n\n[package \"foo\"]\ndepends = bar\n"
        );
    }

    #[test]
    fn test_update_preserves_comments_and_order() {
        let store = MemoryStore::new();
        let path = Path::new("/cfg/toolchain.cfg");
        store.insert(path, SAMPLE);

        update_config(&store, path, "toolchain", "linux", "provide", "foo bar qux").unwrap();
        update_config(&store, path, "toolchain", "linux", "feed", "http://x").unwrap();

        let expected = r#"# qitoolchain configuration
[toolchain "linux"]
provide = foo bar qux
feed = http://x

[package "foo"]
depends = bar baz
"#;
        assert_eq!(store.read(path).unwrap().unwrap(), expected);
    }

    #[test]
    fn test_update_does_not_touch_live_snapshot() {
        let store = MemoryStore::new();
        let path = Path::new("/cfg/toolchain.cfg");
        store.insert(path, SAMPLE);

        let config = ConfigStore::load(&store, path).unwrap();
        update_config(&store, path, "toolchain", "linux", "provide", "only").unwrap();

        assert_eq!(config.get("toolchain", "linux", "provide"), Some("foo bar"));
        let fresh = ConfigStore::load(&store, path).unwrap();
        assert_eq!(fresh.get("toolchain", "linux", "provide"), Some("only"));
    }

    #[test]
    fn test_modify_sees_file_not_snapshot() {
        let store = MemoryStore::new();
        let path = Path::new("/cfg/toolchain.cfg");
        store.insert(path, SAMPLE);

        modify_config(&store, path, "toolchain", "linux", "provide", |current| {
            assert_eq!(current, Some("foo bar"));
            Some(format!("{} qux", current.unwrap_or_default()))
        })
        .unwrap();
        modify_config(&store, path, "toolchain", "linux", "provide", |_| None).unwrap();

        let config = ConfigStore::load(&store, path).unwrap();
        assert_eq!(config.get("toolchain", "linux", "provide"), Some("foo bar qux"));
    }

    #[test]
    fn test_update_on_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("qi").join("toolchain.cfg");
        let store = FsStore::new();

        update_config(&store, &path, "toolchain", "mac", "provide", "boost").unwrap();
        let config = ConfigStore::load(&store, &path).unwrap();
        assert_eq!(config.get_list("toolchain", "mac", "provide"), vec!["boost"]);
    }

    #[test]
    fn test_update_refuses_malformed_file() {
        let store = MemoryStore::new();
        let path = Path::new("/bad.cfg");
        store.insert(path, "garbage\n");

        assert!(update_config(&store, path, "toolchain", "linux", "provide", "foo").is_err());
        assert_eq!(store.read(path).unwrap().as_deref(), Some("garbage\n"));
    }
}
