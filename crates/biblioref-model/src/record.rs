//! The central record entity and its supporting types.

use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Format a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Ris,
    #[default]
    Unknown,
}

/// Record classification. Closed vocabulary with an explicit catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordType {
    JournalArticle,
    Thesis,
    Book,
    BookChapter,
    ConferencePaper,
    Report,
    Webpage,
    #[default]
    Other,
}

impl RecordType {
    /// The string tag used in user-facing surfaces (correction batches,
    /// config). Matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::JournalArticle => "journal-article",
            RecordType::Thesis => "thesis",
            RecordType::Book => "book",
            RecordType::BookChapter => "book-chapter",
            RecordType::ConferencePaper => "conference-paper",
            RecordType::Report => "report",
            RecordType::Webpage => "webpage",
            RecordType::Other => "other",
        }
    }

    /// Resolve a string tag against the closed vocabulary.
    ///
    /// Returns `None` for unrecognized strings; callers decide whether that
    /// is an error (correction apply treats it as "skip this row").
    pub fn parse(s: &str) -> Option<RecordType> {
        match s.trim() {
            "journal-article" => Some(RecordType::JournalArticle),
            "thesis" => Some(RecordType::Thesis),
            "book" => Some(RecordType::Book),
            "book-chapter" => Some(RecordType::BookChapter),
            "conference-paper" => Some(RecordType::ConferencePaper),
            "report" => Some(RecordType::Report),
            "webpage" => Some(RecordType::Webpage),
            "other" => Some(RecordType::Other),
            _ => None,
        }
    }
}

/// Contributor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    #[default]
    Author,
    Editor,
    Translator,
    Advisor,
    Other,
}

/// One author/editor/contributor.
///
/// Both the verbatim literal and the structured family/given split are
/// kept, because real-world exports are messy: the structured form is only
/// filled when it can be derived with confidence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonName {
    /// The name exactly as it appeared in the source.
    pub literal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default)]
    pub role: PersonRole,
}

impl PersonName {
    /// A plain author with only the literal form.
    pub fn from_literal(literal: impl Into<String>) -> Self {
        PersonName {
            literal: literal.into(),
            ..Default::default()
        }
    }

    /// Display string: the literal wins, falling back to "family given".
    pub fn display(&self) -> String {
        let lit = self.literal.trim();
        if !lit.is_empty() {
            return lit.to_string();
        }
        let mut parts = Vec::new();
        if let Some(f) = self.family.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(f);
        }
        if let Some(g) = self.given.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(g);
        }
        parts.join(" ")
    }
}

/// A lossless tag value: a scalar, or a list when the tag repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

impl RawValue {
    /// Append another occurrence of the same tag, promoting to a list.
    pub fn push(&mut self, value: String) {
        match self {
            RawValue::One(first) => {
                let first = std::mem::take(first);
                *self = RawValue::Many(vec![first, value]);
            }
            RawValue::Many(values) => values.push(value),
        }
    }

    /// Iterate the value(s) in original order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        match self {
            RawValue::One(v) => std::slice::from_ref(v).iter(),
            RawValue::Many(vs) => vs.iter(),
        }
        .map(String::as_str)
    }

    /// Mutate the last value in place (continuation lines fold here).
    pub fn last_mut(&mut self) -> &mut String {
        match self {
            RawValue::One(v) => v,
            RawValue::Many(vs) => {
                if vs.is_empty() {
                    vs.push(String::new());
                }
                let idx = vs.len() - 1;
                &mut vs[idx]
            }
        }
    }
}

fn norm_text(s: &str) -> String {
    s.replace('\u{00a0}', " ")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Compute the stable content fingerprint for a record.
///
/// The id must be stable across runs, independent of file paths and record
/// order, and tolerant to formatting noise, so the key is built from
/// normalized (lowercased, punctuation-stripped) title, year, first author
/// display string, and container title. SHA-256 truncated to 16 bytes keeps
/// it short enough for UI keys while avoiding collisions in practice.
pub fn record_id(
    title: Option<&str>,
    year: Option<i32>,
    first_author: Option<&str>,
    container: Option<&str>,
) -> String {
    let key = [
        norm_text(title.unwrap_or("")),
        year.map(|y| y.to_string()).unwrap_or_default(),
        norm_text(first_author.unwrap_or("")),
        norm_text(container.unwrap_or("")),
    ]
    .join("|");

    let digest = Sha256::digest(key.as_bytes());
    digest[..16].iter().fold(String::with_capacity(32), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// A neutral, app-level bibliographic record.
///
/// Canonical fields are derived views extracted at parse time; the
/// [`raw_fields`](Record::raw_fields) bag keeps every original tag so
/// unrecognized or redundant tags survive a load→edit→save round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Content-derived fingerprint, computed once at creation.
    pub id: String,

    // Provenance, used to route writes back to the right file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default)]
    pub source_format: SourceFormat,
    /// 0-based position within the source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_record_index: Option<usize>,

    #[serde(rename = "type", default)]
    pub record_type: RecordType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,

    #[serde(default)]
    pub authors: Vec<PersonName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_title_alt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    /// Kept as a string, normalized to "start-end" where possible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Degree-granting or report-issuing institution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Lossless tag→value(s) map. Canonical fields above are derived from
    /// this at parse time; it is never trimmed afterwards.
    #[serde(default)]
    pub raw_fields: BTreeMap<String, RawValue>,

    /// Set whenever a user or correction edit changes a value.
    #[serde(default)]
    pub dirty: bool,
    /// Last validation result, replaced wholesale each run.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Record {
    /// Create a record, computing its fingerprint from the identity fields.
    pub fn new(
        title: Option<String>,
        year: Option<i32>,
        authors: Vec<PersonName>,
        container_title: Option<String>,
    ) -> Self {
        let first_author = authors.first().map(|a| a.display());
        let id = record_id(
            title.as_deref(),
            year,
            first_author.as_deref(),
            container_title.as_deref(),
        );
        Record {
            id,
            source_file: None,
            source_format: SourceFormat::Unknown,
            source_record_index: None,
            record_type: RecordType::Other,
            title,
            title_alt: None,
            year,
            month: None,
            day: None,
            authors,
            container_title,
            container_title_alt: None,
            volume: None,
            issue: None,
            pages: None,
            publisher: None,
            institution: None,
            doi: None,
            url: None,
            language: None,
            raw_fields: BTreeMap::new(),
            dirty: false,
            issues: Vec::new(),
        }
    }

    pub fn first_author_display(&self) -> Option<String> {
        self.authors.first().map(|a| a.display())
    }

    pub fn container_display(&self) -> Option<&str> {
        self.container_title
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whole-record snapshot for undo and for "mark dirty only if changed"
    /// comparisons. Every mutation path that needs before/after state goes
    /// through this.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_literal() {
        let name = PersonName {
            literal: "Kim, Min Soo".to_string(),
            family: Some("Kim".to_string()),
            given: Some("Min Soo".to_string()),
            ..Default::default()
        };
        assert_eq!(name.display(), "Kim, Min Soo");
    }

    #[test]
    fn display_falls_back_to_structured() {
        let name = PersonName {
            literal: "  ".to_string(),
            family: Some("Smith".to_string()),
            given: Some("Jane".to_string()),
            ..Default::default()
        };
        assert_eq!(name.display(), "Smith Jane");
    }

    #[test]
    fn raw_value_accumulates() {
        let mut v = RawValue::One("first".to_string());
        v.push("second".to_string());
        v.push("third".to_string());
        let all: Vec<&str> = v.values().collect();
        assert_eq!(all, vec!["first", "second", "third"]);
    }

    #[test]
    fn record_id_is_stable_and_path_independent() {
        let a = record_id(Some("A Title"), Some(2020), Some("Smith, J."), Some("Journal"));
        let b = record_id(Some("a  title"), Some(2020), Some("smith j"), Some("journal"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn record_id_changes_with_title() {
        let a = record_id(Some("A Title"), Some(2020), None, None);
        let b = record_id(Some("A Titlf"), Some(2020), None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn record_id_keeps_hangul() {
        let a = record_id(Some("한국어 제목"), None, None, None);
        let b = record_id(Some("한국어제목!!"), None, None, None);
        assert_eq!(a, b);
    }

    #[test]
    fn record_type_round_trips_through_tag() {
        for t in [
            RecordType::JournalArticle,
            RecordType::Thesis,
            RecordType::Book,
            RecordType::BookChapter,
            RecordType::ConferencePaper,
            RecordType::Report,
            RecordType::Webpage,
            RecordType::Other,
        ] {
            assert_eq!(RecordType::parse(t.as_str()), Some(t));
        }
        assert_eq!(RecordType::parse("zine"), None);
    }
}
