//! RIS serialization: canonical fields first, then every raw tag the
//! canonical emission didn't cover.

use crate::error::{Error, Result};
use biblioref_model::{RawValue, Record, RecordType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static PAGE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[-–]\s*(\d+)\s*$").unwrap());

/// Tags covered by canonical field emission. These are removed from the
/// working copy of raw_fields before the extras are dumped, so an edit
/// made through a canonical accessor is not shadowed by a stale raw tag.
/// BT/B1 stay in the extras: they only feed the container as fallbacks,
/// and stripping them would lose their value whenever JO/JF won.
const COVERED_TAGS: &[&str] = &[
    "TY", "TI", "T1", "AU", "A1", "PY", "Y1", "DA", "JO", "JF", "T2", "VL", "IS", "SP", "EP",
    "PB", "IN", "LA", "DO", "UR", "ER",
];

/// Several source tags map onto one record type; this is the single
/// canonical tag chosen when writing.
fn ty_for_record_type(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::JournalArticle => "JOUR",
        RecordType::Thesis => "THES",
        RecordType::Book => "BOOK",
        RecordType::BookChapter => "CHAP",
        RecordType::ConferencePaper => "CPAPER",
        RecordType::Report => "RPRT",
        RecordType::Webpage => "WEB",
        RecordType::Other => "GEN",
    }
}

fn tag_line(tag: &str, value: &str) -> String {
    format!("{tag}  - {value}")
}

fn push_opt(lines: &mut Vec<String>, tag: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(tag_line(tag, v));
    }
}

/// Convert one record to RIS lines.
///
/// Canonical fields are re-emitted under their preferred tags; every
/// remaining raw tag follows in sorted order, one line per value, so
/// exporter-specific tags survive a load→edit→save cycle unchanged.
pub fn record_to_ris_lines(record: &Record) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(tag_line("TY", ty_for_record_type(record.record_type)));

    push_opt(&mut lines, "TI", record.title.as_deref());
    // The alternate title reuses the T1 slot.
    push_opt(&mut lines, "T1", record.title_alt.as_deref());

    for author in &record.authors {
        let name = author.display();
        if !name.is_empty() {
            lines.push(tag_line("AU", &name));
        }
    }

    if let Some(year) = record.year {
        lines.push(tag_line("PY", &year.to_string()));
    }

    push_opt(&mut lines, "JO", record.container_title.as_deref());
    push_opt(&mut lines, "VL", record.volume.as_deref());
    push_opt(&mut lines, "IS", record.issue.as_deref());

    // Pages: split back into SP/EP when the value is a numeric range.
    if let Some(pages) = record.pages.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        match PAGE_RANGE_RE.captures(pages) {
            Some(caps) => {
                lines.push(tag_line("SP", &caps[1]));
                lines.push(tag_line("EP", &caps[2]));
            }
            None => lines.push(tag_line("SP", pages)),
        }
    }

    push_opt(&mut lines, "PB", record.publisher.as_deref());
    push_opt(&mut lines, "IN", record.institution.as_deref());
    push_opt(&mut lines, "LA", record.language.as_deref());
    push_opt(&mut lines, "DO", record.doi.as_deref());
    push_opt(&mut lines, "UR", record.url.as_deref());

    // Everything the canonical fields didn't cover, in stable tag order.
    let mut extras = record.raw_fields.clone();
    for tag in COVERED_TAGS {
        extras.remove(*tag);
    }
    for (tag, value) in &extras {
        match value {
            RawValue::One(v) => push_opt(&mut lines, tag, Some(v)),
            RawValue::Many(vs) => {
                for v in vs {
                    push_opt(&mut lines, tag, Some(v));
                }
            }
        }
    }

    lines.push(tag_line("ER", ""));
    lines
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".bak");
    PathBuf::from(os)
}

/// Write records back to a RIS file.
///
/// When `backup` is set and the destination exists, its prior content is
/// copied to a `.bak` sibling strictly before the destination is opened
/// for writing, so a failed write never costs the original data.
pub fn write_ris(path: &Path, records: &[Record], backup: bool) -> Result<()> {
    if backup && path.exists() {
        let bak = backup_path(path);
        std::fs::copy(path, &bak).map_err(|source| Error::Backup {
            path: path.to_path_buf(),
            backup: bak.clone(),
            source,
        })?;
    }

    let mut out_lines = Vec::new();
    for rec in records {
        out_lines.extend(record_to_ris_lines(rec));
        out_lines.push(String::new());
    }
    let text = format!("{}\n", out_lines.join("\n").trim_end());

    std::fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), records = records.len(), backup, "wrote RIS file");
    Ok(())
}
