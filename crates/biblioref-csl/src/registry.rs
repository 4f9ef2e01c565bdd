//! Style discovery and selection.
//!
//! A style is addressed by a selector string: `builtin:<key>` for the
//! formatter variants shipped with the application, `csl:<path>` for a
//! style description file on disk. The registry scans user-chosen
//! folders for style files, de-duplicates by file stem (first folder
//! wins) and owns the parse and variable-resolution caches.

use crate::error::{Error, Result};
use crate::tree::{StyleNode, parse_style_tree};
use crate::variables::{csl_type_for, variables_for_type};
use biblioref_model::RecordType;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Builtin,
    Csl,
}

/// One selectable style: a builtin formatter or a discovered style file.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRef {
    pub kind: StyleKind,
    /// Builtin key or file stem.
    pub key: String,
    /// Human-readable display name.
    pub name: String,
    pub path: Option<PathBuf>,
}

impl StyleRef {
    pub fn builtin(key: &str, name: &str) -> Self {
        StyleRef {
            kind: StyleKind::Builtin,
            key: key.to_string(),
            name: name.to_string(),
            path: None,
        }
    }

    pub fn to_selector(&self) -> String {
        match (self.kind, &self.path) {
            (StyleKind::Csl, Some(path)) => format!("csl:{}", path.display()),
            _ => format!("builtin:{}", self.key),
        }
    }

    /// Parse a selector string back into a reference. The display name
    /// of a file-backed style is its stem until the registry refines it.
    pub fn parse_selector(selector: &str) -> Option<StyleRef> {
        if let Some(key) = selector.strip_prefix("builtin:") {
            if key.is_empty() {
                return None;
            }
            return Some(StyleRef::builtin(key, key));
        }
        if let Some(raw) = selector.strip_prefix("csl:") {
            if raw.is_empty() {
                return None;
            }
            let path = PathBuf::from(raw);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| raw.to_string());
            return Some(StyleRef {
                kind: StyleKind::Csl,
                key: stem.clone(),
                name: stem,
                path: Some(path),
            });
        }
        None
    }
}

/// Display name from the style's own metadata, filename stem fallback.
fn style_title(tree: &StyleNode) -> Option<String> {
    let title = tree.child("info")?.child("title")?;
    let text = title.text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Registry of selectable styles plus the session caches.
///
/// Style files are assumed stable for the process lifetime; a caller
/// that watches for edits invalidates with [`StyleRegistry::clear_cache`].
#[derive(Debug, Default)]
pub struct StyleRegistry {
    builtins: Vec<StyleRef>,
    discovered: Vec<StyleRef>,
    /// Parsed trees by normalized absolute path; `None` marks a file
    /// whose content failed to parse, so it is not re-parsed each call.
    trees: HashMap<PathBuf, Option<StyleNode>>,
    variables: HashMap<(PathBuf, &'static str), BTreeSet<String>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry {
            builtins: vec![StyleRef::builtin("default", "Default (author-date)")],
            ..Default::default()
        }
    }

    /// Scan folders for `*.csl` files, earlier folders shadowing later
    /// ones by file stem. Re-scans replace the previous discovery.
    pub fn discover(&mut self, folders: &[PathBuf]) {
        self.discovered.clear();
        let mut seen_stems: BTreeSet<String> = BTreeSet::new();

        for folder in folders {
            let entries = match std::fs::read_dir(folder) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::debug!(folder = %folder.display(), %err, "skipping style folder");
                    continue;
                }
            };
            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("csl"))
                })
                .collect();
            paths.sort_by_key(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()));

            for path in paths {
                let stem = match path.file_stem() {
                    Some(stem) => stem.to_string_lossy().into_owned(),
                    None => continue,
                };
                if !seen_stems.insert(stem.to_lowercase()) {
                    continue;
                }
                let name = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|text| parse_style_tree(&text).ok())
                    .and_then(|tree| style_title(&tree))
                    .unwrap_or_else(|| stem.clone());
                self.discovered.push(StyleRef {
                    kind: StyleKind::Csl,
                    key: stem,
                    name,
                    path: Some(path),
                });
            }
        }
        tracing::debug!(count = self.discovered.len(), "discovered style files");
    }

    /// Builtins first, then discovered styles in scan order.
    pub fn all(&self) -> impl Iterator<Item = &StyleRef> {
        self.builtins.iter().chain(self.discovered.iter())
    }

    pub fn find(&self, selector: &str) -> Option<&StyleRef> {
        self.all().find(|s| s.to_selector() == selector)
    }

    /// Variables the style at `path` renders for `record_type`.
    ///
    /// A file that cannot be read is an error; a file that reads but
    /// does not parse resolves to the empty set.
    pub fn variables_for(
        &mut self,
        path: &Path,
        record_type: RecordType,
    ) -> Result<BTreeSet<String>> {
        let resolved = normalize_path(path);
        let csl_type = csl_type_for(record_type);
        if let Some(cached) = self.variables.get(&(resolved.clone(), csl_type)) {
            return Ok(cached.clone());
        }

        if !self.trees.contains_key(&resolved) {
            let text = std::fs::read_to_string(&resolved).map_err(|source| Error::Read {
                path: resolved.clone(),
                source,
            })?;
            let tree = match parse_style_tree(&text) {
                Ok(tree) => Some(tree),
                Err(err) => {
                    tracing::debug!(path = %resolved.display(), %err, "malformed style file");
                    None
                }
            };
            self.trees.insert(resolved.clone(), tree);
        }

        let vars = match &self.trees[&resolved] {
            Some(tree) => variables_for_type(tree, csl_type),
            None => BTreeSet::new(),
        };
        self.variables.insert((resolved, csl_type), vars.clone());
        Ok(vars)
    }

    pub fn clear_cache(&mut self) {
        self.trees.clear();
        self.variables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_style(dir: &Path, stem: &str, title: Option<&str>) -> PathBuf {
        let body = match title {
            Some(t) => format!(
                "<style><info><title>{t}</title></info><layout><text variable=\"title\"/></layout></style>"
            ),
            None => "<style><layout><text variable=\"title\"/></layout></style>".to_string(),
        };
        let path = dir.join(format!("{stem}.csl"));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn selector_round_trip() {
        let builtin = StyleRef::builtin("default", "Default (author-date)");
        assert_eq!(builtin.to_selector(), "builtin:default");
        let parsed = StyleRef::parse_selector("builtin:default").unwrap();
        assert_eq!(parsed.kind, StyleKind::Builtin);
        assert_eq!(parsed.key, "default");

        let parsed = StyleRef::parse_selector("csl:/styles/apa-7.csl").unwrap();
        assert_eq!(parsed.kind, StyleKind::Csl);
        assert_eq!(parsed.key, "apa-7");
        assert_eq!(parsed.to_selector(), "csl:/styles/apa-7.csl");

        assert!(StyleRef::parse_selector("builtin:").is_none());
        assert!(StyleRef::parse_selector("nonsense").is_none());
    }

    #[test]
    fn discovery_reads_titles_and_dedups_by_stem() {
        let user = tempfile::tempdir().unwrap();
        let shipped = tempfile::tempdir().unwrap();
        write_style(user.path(), "apa", Some("APA (user copy)"));
        write_style(shipped.path(), "apa", Some("APA 7th edition"));
        write_style(shipped.path(), "chicago", None);
        std::fs::write(shipped.path().join("notes.txt"), "not a style").unwrap();

        let mut reg = StyleRegistry::new();
        reg.discover(&[user.path().to_path_buf(), shipped.path().to_path_buf()]);

        let names: Vec<&str> = reg
            .all()
            .filter(|s| s.kind == StyleKind::Csl)
            .map(|s| s.name.as_str())
            .collect();
        // User folder shadows the shipped apa; chicago falls back to its stem.
        assert_eq!(names, vec!["APA (user copy)", "chicago"]);
        assert!(reg.all().any(|s| s.to_selector() == "builtin:default"));
    }

    #[test]
    fn discovery_skips_missing_folder_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.csl"), "<style><choose>").unwrap();

        let mut reg = StyleRegistry::new();
        reg.discover(&[PathBuf::from("/no/such/folder"), dir.path().to_path_buf()]);
        // Broken file is still listed (stem name), resolution just yields nothing.
        let broken = reg
            .all()
            .find(|s| s.key == "broken")
            .cloned()
            .unwrap();
        let vars = reg
            .variables_for(broken.path.as_deref().unwrap(), RecordType::Book)
            .unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn variables_are_cached_per_path_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_style(dir.path(), "minimal", None);

        let mut reg = StyleRegistry::new();
        let first = reg.variables_for(&path, RecordType::Book).unwrap();
        assert_eq!(first.iter().collect::<Vec<_>>(), vec!["title"]);

        // A rewrite is invisible until the cache is cleared.
        std::fs::write(&path, "<style><layout><text variable=\"author\"/></layout></style>")
            .unwrap();
        let stale = reg.variables_for(&path, RecordType::Book).unwrap();
        assert_eq!(stale, first);

        reg.clear_cache();
        let fresh = reg.variables_for(&path, RecordType::Book).unwrap();
        assert_eq!(fresh.iter().collect::<Vec<_>>(), vec!["author"]);
    }

    #[test]
    fn unreadable_style_is_an_error() {
        let mut reg = StyleRegistry::new();
        let err = reg.variables_for(Path::new("/no/such/style.csl"), RecordType::Book);
        assert!(err.is_err());
    }
}
