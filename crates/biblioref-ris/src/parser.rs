//! Single-pass line-oriented tag-block parser.
//!
//! Two states: outside any record, and inside one. `TY` begins a record
//! (discarding any partial state), `ER` finalizes it. Lines that match
//! neither the tag pattern nor the continuation indentation are ignored,
//! which keeps the parser forward-compatible with exporters that emit
//! stray headers or banners between records.

use crate::encoding::read_text_guess;
use crate::error::Result;
use biblioref_model::{PersonName, RawValue, Record, RecordType, SourceFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// RIS tag line: "TY  - JOUR". Tag is 2+ uppercase/digit chars, then two
/// spaces, a dash, and an optional single space before the value.
static TAG_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]{2,})\s{2}-\s?(.*)$").unwrap());

/// Continuation lines are indented by exactly six spaces (rare but real).
static CONTINUATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{6}(.*)$").unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(19\d{2}|20\d{2})").unwrap());

type RawBlock = BTreeMap<String, RawValue>;

/// Map a RIS `TY` value onto the closed record-type vocabulary.
fn record_type_from_ty(ty: &str) -> RecordType {
    match ty.to_uppercase().as_str() {
        "JOUR" | "JFULL" => RecordType::JournalArticle,
        "THES" | "DISS" => RecordType::Thesis,
        "BOOK" => RecordType::Book,
        "CHAP" => RecordType::BookChapter,
        "CPAPER" | "CONF" => RecordType::ConferencePaper,
        "RPRT" => RecordType::Report,
        "WEB" => RecordType::Webpage,
        _ => RecordType::Other,
    }
}

fn clean(s: &str) -> Option<String> {
    let collapsed = s
        .replace('\u{00a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn add_raw(raw: &mut RawBlock, tag: &str, value: &str) {
    match raw.get_mut(tag) {
        Some(existing) => existing.push(value.to_string()),
        None => {
            raw.insert(tag.to_string(), RawValue::One(value.to_string()));
        }
    }
}

/// First non-empty cleaned value among the given tags, in precedence order.
fn get_first(raw: &RawBlock, tags: &[&str]) -> Option<String> {
    for tag in tags {
        if let Some(value) = raw.get(*tag) {
            for v in value.values() {
                if let Some(cleaned) = clean(v) {
                    return Some(cleaned);
                }
            }
        }
    }
    None
}

/// All non-empty cleaned values under one tag, in original order.
fn get_all(raw: &RawBlock, tag: &str) -> Vec<String> {
    raw.get(tag)
        .map(|v| v.values().filter_map(clean).collect())
        .unwrap_or_default()
}

/// Scan the date-bearing tags for a 4-digit year in 1900–2099; first
/// match wins.
fn parse_year(raw: &RawBlock) -> Option<i32> {
    for tag in ["PY", "Y1", "DA"] {
        if let Some(v) = get_first(raw, &[tag]) {
            if let Some(m) = YEAR_RE.find(&v) {
                if let Ok(y) = m.as_str().parse::<i32>() {
                    return Some(y);
                }
            }
        }
    }
    None
}

/// Normalize an LA tag via the alias table, falling back to a truncated
/// lowercase passthrough for codes the table doesn't know.
fn normalize_language(v: &str) -> String {
    let lower = v.trim().to_lowercase();
    match lower.as_str() {
        "korean" | "kor" | "ko" | "한국어" => "ko".to_string(),
        "english" | "eng" | "en" => "en".to_string(),
        "chinese" | "chi" | "zho" | "zh" => "zh".to_string(),
        "japanese" | "jpn" | "ja" => "ja".to_string(),
        _ => lower.chars().take(10).collect(),
    }
}

fn parse_language(raw: &RawBlock) -> Option<String> {
    get_first(raw, &["LA"]).map(|v| normalize_language(&v))
}

/// SP/EP combine into "start-end" when both present.
fn parse_pages(raw: &RawBlock) -> Option<String> {
    let sp = get_first(raw, &["SP"]);
    let ep = get_first(raw, &["EP"]);
    match (sp, ep) {
        (Some(sp), Some(ep)) => Some(format!("{sp}-{ep}")),
        (Some(sp), None) => Some(sp),
        (None, Some(ep)) => Some(ep),
        (None, None) => None,
    }
}

/// Author tags AU then A1, concatenated in that fixed order.
fn parse_authors(raw: &RawBlock) -> Vec<PersonName> {
    let mut names = get_all(raw, "AU");
    names.extend(get_all(raw, "A1"));
    names.into_iter().map(PersonName::from_literal).collect()
}

fn block_to_record(raw: RawBlock, index: usize, source_file: Option<&str>) -> Record {
    let ty = get_first(&raw, &["TY"]).unwrap_or_else(|| "GEN".to_string());

    let title = get_first(&raw, &["TI", "T1"]);
    // T2 is sometimes the container, but it also serves as the alternate
    // title slot; the container precedence list below covers the former.
    let title_alt = get_first(&raw, &["T2"]);
    let container = get_first(&raw, &["JO", "JF", "T2", "BT", "B1"]);
    let year = parse_year(&raw);
    let authors = parse_authors(&raw);

    let mut rec = Record::new(title, year, authors, container);
    rec.record_type = record_type_from_ty(&ty);
    rec.source_file = source_file.map(str::to_string);
    rec.source_format = SourceFormat::Ris;
    rec.source_record_index = Some(index);
    rec.title_alt = title_alt;
    rec.volume = get_first(&raw, &["VL"]);
    rec.issue = get_first(&raw, &["IS"]);
    rec.pages = parse_pages(&raw);
    rec.doi = get_first(&raw, &["DO"]);
    rec.url = get_first(&raw, &["UR"]);
    rec.publisher = get_first(&raw, &["PB"]);
    // IN is not standard RIS, but appears in some exports.
    rec.institution = get_first(&raw, &["IN"]);
    rec.language = parse_language(&raw);
    rec.raw_fields = raw;
    rec
}

/// Parse RIS text into records. Total over its input: garbage lines are
/// skipped and a record left open at end of stream is still emitted.
pub fn parse_ris_text(text: &str, source_file: Option<&str>) -> Vec<Record> {
    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut cur = RawBlock::new();
    let mut in_record = false;
    let mut last_tag: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(caps) = TAG_LINE_RE.captures(line) {
            let tag = &caps[1];
            let value = caps[2].trim_end();

            if tag == "TY" {
                // Begin tag: any partial state is discarded.
                cur.clear();
                in_record = true;
                last_tag = Some("TY".to_string());
                add_raw(&mut cur, "TY", value);
                continue;
            }

            if !in_record {
                continue;
            }

            add_raw(&mut cur, tag, value);
            last_tag = Some(tag.to_string());

            if tag == "ER" {
                blocks.push(std::mem::take(&mut cur));
                in_record = false;
                last_tag = None;
            }
            continue;
        }

        // Continuation of the previous tag's value.
        if in_record {
            if let (Some(caps), Some(tag)) = (CONTINUATION_RE.captures(line), last_tag.as_deref())
            {
                let extra = caps[1].trim_end();
                match cur.get_mut(tag) {
                    Some(value) => {
                        let last = value.last_mut();
                        *last = format!("{last} {extra}").trim().to_string();
                    }
                    None => add_raw(&mut cur, tag, extra),
                }
            }
        }
        // Anything else is ignored.
    }

    // Truncated export: no terminating ER, but the data is still real.
    if in_record && !cur.is_empty() {
        blocks.push(cur);
    }

    blocks
        .into_iter()
        .enumerate()
        .map(|(i, raw)| block_to_record(raw, i, source_file))
        .collect()
}

/// Parse a RIS file. Returns the records and the encoding label used.
pub fn parse_ris_file(path: &Path) -> Result<(Vec<Record>, &'static str)> {
    let (text, encoding) = read_text_guess(path)?;
    let records = parse_ris_text(&text, Some(&path.to_string_lossy()));
    tracing::debug!(path = %path.display(), count = records.len(), "parsed RIS file");
    Ok((records, encoding))
}
