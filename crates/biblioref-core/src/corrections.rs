//! Correction batch round trip: generate a CSV template from the
//! current records and their issues, let the user fill in new values in
//! a spreadsheet, then apply the edited file back.
//!
//! Per-row problems (unknown id, unsupported field) are collected in
//! the outcome, never raised; only a missing input file is an error.

use crate::error::{Error, Result};
use biblioref_model::{PersonName, Record, RecordType, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;

/// Fields a correction row may target.
pub const EDITABLE_FIELDS: &[&str] = &[
    "type",
    "title",
    "title_alt",
    "year",
    "authors",
    "container_title",
    "container_title_alt",
    "volume",
    "issue",
    "pages",
    "doi",
    "url",
    "publisher",
    "institution",
];

/// Candidate fields offered in a generated template, in row order.
const CANDIDATE_FIELDS: &[&str] = &[
    "type",
    "title",
    "authors",
    "year",
    "container_title",
    "volume",
    "issue",
    "pages",
    "doi",
    "url",
    "publisher",
    "institution",
];

/// Core fields that are always offered even when the template is
/// narrowed to issue-bearing fields.
const CORE_FIELDS: &[&str] = &["type", "title", "authors", "year", "container_title"];

const ROW_NOTE: &str = "Enter a replacement in new_value; leave it empty to keep the current value.";

#[derive(Debug, Serialize, Deserialize)]
struct CorrectionRow {
    record_id: String,
    source_file: String,
    field: String,
    current_value: String,
    new_value: String,
    note: String,
    title_hint: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub rows_read: usize,
    pub changes_applied: usize,
    pub errors: Vec<String>,
}

fn authors_to_str(record: &Record) -> String {
    record
        .authors
        .iter()
        .map(|a| a.display())
        .filter(|d| !d.trim().is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn current_value(record: &Record, field: &str) -> String {
    match field {
        "type" => record.record_type.as_str().to_string(),
        "title" => record.title.clone().unwrap_or_default(),
        "title_alt" => record.title_alt.clone().unwrap_or_default(),
        "year" => record.year.map(|y| y.to_string()).unwrap_or_default(),
        "authors" => authors_to_str(record),
        "container_title" => record.container_title.clone().unwrap_or_default(),
        "container_title_alt" => record.container_title_alt.clone().unwrap_or_default(),
        "volume" => record.volume.clone().unwrap_or_default(),
        "issue" => record.issue.clone().unwrap_or_default(),
        "pages" => record.pages.clone().unwrap_or_default(),
        "doi" => record.doi.clone().unwrap_or_default(),
        "url" => record.url.clone().unwrap_or_default(),
        "publisher" => record.publisher.clone().unwrap_or_default(),
        "institution" => record.institution.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

fn set_string_field(slot: &mut Option<String>, new_value: &str) -> bool {
    let old = slot.as_deref().unwrap_or("").trim();
    if old == new_value {
        return false;
    }
    *slot = if new_value.is_empty() {
        None
    } else {
        Some(new_value.to_string())
    };
    true
}

/// Apply one value to one field. Returns whether the record changed.
///
/// Non-numeric years and unrecognized types are skipped quietly, so
/// stray text in a spreadsheet cell never corrupts a record.
fn set_field_value(record: &mut Record, field: &str, new_value: &str) -> bool {
    let new_value = new_value.trim();
    match field {
        "authors" => {
            if new_value.is_empty() {
                if record.authors.is_empty() {
                    return false;
                }
                record.authors.clear();
                return true;
            }
            if authors_to_str(record) == new_value {
                return false;
            }
            record.authors = new_value
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PersonName::from_literal)
                .collect();
            true
        }
        "year" => {
            if new_value.is_empty() {
                return record.year.take().is_some();
            }
            match new_value.parse::<i32>() {
                Ok(y) if record.year != Some(y) => {
                    record.year = Some(y);
                    true
                }
                _ => false,
            }
        }
        "type" => match RecordType::parse(new_value) {
            Some(rt) if record.record_type != rt => {
                record.record_type = rt;
                true
            }
            _ => false,
        },
        "title" => set_string_field(&mut record.title, new_value),
        "title_alt" => set_string_field(&mut record.title_alt, new_value),
        "container_title" => set_string_field(&mut record.container_title, new_value),
        "container_title_alt" => set_string_field(&mut record.container_title_alt, new_value),
        "volume" => set_string_field(&mut record.volume, new_value),
        "issue" => set_string_field(&mut record.issue, new_value),
        "pages" => set_string_field(&mut record.pages, new_value),
        "doi" => set_string_field(&mut record.doi, new_value),
        "url" => set_string_field(&mut record.url, new_value),
        "publisher" => set_string_field(&mut record.publisher, new_value),
        "institution" => set_string_field(&mut record.institution, new_value),
        _ => false,
    }
}

/// Fields named by a record's current issues, with the composite
/// "volume/issue" expanded to both components.
fn issue_fields(record: &Record) -> Vec<String> {
    let mut fields = Vec::new();
    for issue in &record.issues {
        if issue.field == "volume/issue" {
            for f in ["volume", "issue"] {
                if !fields.iter().any(|x| x == f) {
                    fields.push(f.to_string());
                }
            }
        } else if !fields.iter().any(|x| x == &issue.field) {
            fields.push(issue.field.clone());
        }
    }
    fields
}

/// Write a correction template. Returns the number of rows written.
///
/// With `include_all_records`, every record gets the full candidate
/// field set; otherwise only issue-bearing records are included
/// (error/warn severities only when `only_error_warn`), offering the
/// core fields plus fields named by that record's issues.
pub fn generate_corrections_csv(
    records: &[Record],
    path: &Path,
    include_all_records: bool,
    only_error_warn: bool,
) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    // BOM so spreadsheet tools pick up UTF-8.
    file.write_all(b"\xef\xbb\xbf")?;
    let mut writer = csv::Writer::from_writer(file);

    let mut rows = 0usize;
    for record in records {
        if !include_all_records {
            let selected = match only_error_warn {
                true => record
                    .issues
                    .iter()
                    .any(|i| matches!(i.severity, Severity::Error | Severity::Warn)),
                false => !record.issues.is_empty(),
            };
            if !selected {
                continue;
            }
        }

        let named = issue_fields(record);
        for field in CANDIDATE_FIELDS {
            if !include_all_records
                && !CORE_FIELDS.contains(field)
                && !named.iter().any(|f| f == field)
            {
                continue;
            }
            writer.serialize(CorrectionRow {
                record_id: record.id.clone(),
                source_file: record.source_file.clone().unwrap_or_default(),
                field: (*field).to_string(),
                current_value: current_value(record, field),
                new_value: String::new(),
                note: ROW_NOTE.to_string(),
                title_hint: record.title.clone().unwrap_or_default(),
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows, "wrote correction template");
    Ok(rows)
}

/// Apply an edited correction file back onto the records.
pub fn apply_corrections_csv(records: &mut [Record], path: &Path) -> Result<ApplyOutcome> {
    if !path.exists() {
        return Err(Error::CorrectionsNotFound(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path)?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let index: HashMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    let mut outcome = ApplyOutcome::default();
    for row in reader.deserialize::<CorrectionRow>() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                outcome.rows_read += 1;
                outcome
                    .errors
                    .push(format!("row {}: unreadable: {err}", outcome.rows_read));
                continue;
            }
        };
        outcome.rows_read += 1;

        let rid = row.record_id.trim();
        let Some(&idx) = index.get(rid) else {
            outcome
                .errors
                .push(format!("row {}: record id not found: {rid}", outcome.rows_read));
            continue;
        };

        let field = row.field.trim();
        if !EDITABLE_FIELDS.contains(&field) {
            outcome
                .errors
                .push(format!("row {}: unsupported field: {field}", outcome.rows_read));
            continue;
        }

        let new_value = row.new_value.trim();
        if new_value.is_empty() {
            // Empty means "no change".
            continue;
        }

        if set_field_value(&mut records[idx], field, new_value) {
            records[idx].dirty = true;
            outcome.changes_applied += 1;
        }
    }

    tracing::info!(
        path = %path.display(),
        rows = outcome.rows_read,
        changes = outcome.changes_applied,
        errors = outcome.errors.len(),
        "applied correction file"
    );
    Ok(outcome)
}
