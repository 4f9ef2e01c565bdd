//! Project container: a loaded folder of records plus settings.

use crate::issue::Issue;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Reference list sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    None,
    #[default]
    AuthorYear,
    YearAuthor,
    Title,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::None => "none",
            SortMode::AuthorYear => "author_year",
            SortMode::YearAuthor => "year_author",
            SortMode::Title => "title",
        }
    }

    pub fn parse(s: &str) -> Option<SortMode> {
        match s.trim() {
            "none" => Some(SortMode::None),
            "author_year" => Some(SortMode::AuthorYear),
            "year_author" => Some(SortMode::YearAuthor),
            "title" => Some(SortMode::Title),
            _ => None,
        }
    }
}

/// Settings that affect formatting, validation, and saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Style selector, e.g. "builtin:default" or "csl:/path/to/style.csl".
    pub style_selector: String,
    pub sort_mode: SortMode,
    /// Write a .bak sibling before overwriting source files.
    pub backup_on_save: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            style_selector: "builtin:default".to_string(),
            sort_mode: SortMode::AuthorYear,
            backup_on_save: true,
        }
    }
}

/// A loaded folder and its records.
///
/// Records own no cross-references, so dropping the project drops
/// everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub folder: String,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub records: Vec<Record>,
    /// Project-level issues (file read errors and the like).
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Project {
    pub fn new(folder: impl Into<String>) -> Self {
        Project {
            folder: folder.into(),
            ..Default::default()
        }
    }

    pub fn get_record(&self, record_id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == record_id)
    }

    pub fn get_record_mut(&mut self, record_id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id == record_id)
    }

    pub fn dirty_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.dirty)
    }

    /// JSON serialization for project snapshots.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Project> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PersonName;

    #[test]
    fn project_json_round_trip() {
        let mut proj = Project::new("/tmp/refs");
        let mut rec = Record::new(
            Some("Testing".to_string()),
            Some(2021),
            vec![PersonName::from_literal("Doe, Jane")],
            Some("Journal of Tests".to_string()),
        );
        rec.dirty = true;
        proj.records.push(rec);

        let json = proj.to_json().unwrap();
        let back = Project::from_json(&json).unwrap();
        assert_eq!(back.records.len(), 1);
        assert_eq!(back.records[0], proj.records[0]);
        assert_eq!(back.settings, proj.settings);
    }

    #[test]
    fn lookup_by_id() {
        let mut proj = Project::new(".");
        let rec = Record::new(Some("T".to_string()), None, vec![], None);
        let id = rec.id.clone();
        proj.records.push(rec);
        assert!(proj.get_record(&id).is_some());
        assert!(proj.get_record("missing").is_none());
    }
}
