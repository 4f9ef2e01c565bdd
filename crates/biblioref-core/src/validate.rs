//! Record validation. Replaces `record.issues` wholesale on every run;
//! never fails, every defect becomes an Issue.

use biblioref_model::{Issue, Record, RecordType, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static DOI_FULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^10\.\d{4,9}/[-._;()/:a-z0-9]+$").unwrap());
static PAGES_OK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(-\d+)?$").unwrap());

const YEAR_MIN: i32 = 1900;
const YEAR_MAX: i32 = 2099;

/// Container titles that look like publishing bodies rather than journal
/// names, hinting at a swapped field.
const INSTITUTION_KEYWORDS: &[&str] = &["대학교", "학회", "연구소", "University", "Institute"];

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Validate one record, replacing its issue list and returning a copy.
pub fn validate_record(record: &mut Record) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();
    let rid = record.id.clone();
    let mut add = |severity: Severity, field: &str, message: String, code: &str| {
        issues.push(Issue::new(severity, field, message, Some(rid.clone()), code));
    };

    if !has_text(&record.title) {
        add(
            Severity::Error,
            "title",
            "title is empty".to_string(),
            "missing_required",
        );
    }

    let no_authors = record.authors.is_empty()
        || record.authors.iter().all(|a| a.display().trim().is_empty());
    if no_authors {
        add(
            Severity::Error,
            "authors",
            "author list is empty".to_string(),
            "missing_required",
        );
    }

    match record.year {
        None => add(
            Severity::Warn,
            "year",
            "year is missing".to_string(),
            "missing_recommended",
        ),
        Some(y) if !(YEAR_MIN..=YEAR_MAX).contains(&y) => add(
            Severity::Error,
            "year",
            format!("year out of range: {y}"),
            "bad_value",
        ),
        Some(_) => {}
    }

    match record.record_type {
        RecordType::JournalArticle => {
            if !has_text(&record.container_title) {
                add(
                    Severity::Error,
                    "container_title",
                    "journal title is empty".to_string(),
                    "missing_required",
                );
            }
            if !has_text(&record.volume) && !has_text(&record.issue) {
                add(
                    Severity::Warn,
                    "volume/issue",
                    "volume and issue are both missing".to_string(),
                    "missing_recommended",
                );
            }
            if !has_text(&record.pages) {
                add(
                    Severity::Warn,
                    "pages",
                    "pages are missing".to_string(),
                    "missing_recommended",
                );
            }
        }
        RecordType::Thesis => {
            if !has_text(&record.institution) {
                add(
                    Severity::Warn,
                    "institution",
                    "degree-granting institution is missing".to_string(),
                    "missing_recommended",
                );
            }
        }
        RecordType::Book | RecordType::BookChapter => {
            if !has_text(&record.publisher) {
                add(
                    Severity::Warn,
                    "publisher",
                    "publisher is missing".to_string(),
                    "missing_recommended",
                );
            }
        }
        _ => {}
    }

    if let Some(doi) = record.doi.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !DOI_FULL_RE.is_match(doi) {
            add(
                Severity::Warn,
                "doi",
                format!("DOI does not look well-formed: {doi}"),
                "bad_format",
            );
        }
    }

    if let Some(url) = record.url.as_deref().filter(|s| !s.is_empty()) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            add(
                Severity::Warn,
                "url",
                format!("URL does not start with http(s): {url}"),
                "bad_format",
            );
        }
    }

    if let Some(pages) = record.pages.as_deref().filter(|s| !s.is_empty()) {
        let unified = pages
            .trim()
            .replace(['\u{2013}', '\u{2014}'], "-")
            .replace(' ', "");
        if !PAGES_OK_RE.is_match(&unified) {
            add(
                Severity::Warn,
                "pages",
                format!("page format looks unusual: {pages}"),
                "bad_format",
            );
        }
    }

    // Digits in a name usually mean the parser got garbage. One issue
    // per record is enough.
    for author in &record.authors {
        let display = author.display();
        if display.chars().any(|c| c.is_ascii_digit()) {
            add(
                Severity::Warn,
                "authors",
                format!("author name contains digits (possible parse defect): {display}"),
                "suspicious",
            );
            break;
        }
    }

    if record.record_type == RecordType::JournalArticle {
        if let Some(ct) = record.container_title.as_deref() {
            if INSTITUTION_KEYWORDS.iter().any(|kw| ct.contains(kw)) {
                add(
                    Severity::Info,
                    "container_title",
                    format!("journal title looks like an institution name (fields may be swapped): {ct}"),
                    "suspicious",
                );
            }
        }
    }

    record.issues = issues.clone();
    issues
}

/// Validate every record and return the flattened issue list.
pub fn validate_records(records: &mut [Record]) -> Vec<Issue> {
    let mut all = Vec::new();
    for record in records {
        all.extend(validate_record(record));
    }
    all
}

/// Keep only issues whose field is relevant to an editor field set.
/// The composite "volume/issue" field counts as relevant when either
/// component is.
pub fn filter_issues_for_fields<'a>(
    issues: &'a [Issue],
    relevant_fields: &BTreeSet<&str>,
) -> Vec<&'a Issue> {
    issues
        .iter()
        .filter(|issue| match issue.field.as_str() {
            "volume/issue" => {
                relevant_fields.contains("volume") || relevant_fields.contains("issue")
            }
            field => relevant_fields.contains(field),
        })
        .collect()
}
