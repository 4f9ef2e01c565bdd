//! In-place record normalization.
//!
//! Every rule is idempotent: the pipeline re-runs normalization freely
//! after each edit, so `normalize(normalize(r))` must equal
//! `normalize(r)`. Range checking is the validator's job; this module
//! only cleans shapes.

use biblioref_model::{PersonName, RawValue, Record};
use once_cell::sync::Lazy;
use regex::Regex;

static PAGES_RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)-(\d+)$").unwrap());
static PAGES_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(pp\.?|p\.)").unwrap());
static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(10\.\d{4,9}/[-._;()/:A-Z0-9]+)").unwrap());
static DOI_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^doi\s*:\s*").unwrap());
static DOI_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://(dx\.)?doi\.org/").unwrap());
static COMMA_SPACING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Collapse whitespace runs (NBSP included) to single spaces and trim.
/// Empty-after-trim becomes absent.
fn clean_spaces(s: &str) -> Option<String> {
    let cleaned = s
        .replace('\u{00a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

fn clean_opt(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(clean_spaces)
}

const TITLE_NOISE: &[char] = &[
    ' ', '\'', '"', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}', '\u{300c}', '\u{300d}',
    '\u{300e}', '\u{300f}',
];

pub fn normalize_title(value: &Option<String>) -> Option<String> {
    let s = clean_opt(value)?;
    let trimmed = s.trim_matches(TITLE_NOISE);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_container(value: &Option<String>) -> Option<String> {
    clean_opt(value)
}

pub fn normalize_pages(value: &Option<String>) -> Option<String> {
    let s = clean_opt(value)?;
    let unified = s.replace(['\u{2013}', '\u{2014}'], "-").replace(' ', "");
    if let Some(caps) = PAGES_RANGE_RE.captures(&unified) {
        return Some(format!("{}-{}", &caps[1], &caps[2]));
    }
    let stripped = PAGES_PREFIX_RE.replace(&unified, "").trim().to_string();
    if stripped.is_empty() { None } else { Some(stripped) }
}

pub fn normalize_url(value: &Option<String>) -> Option<String> {
    let s = clean_opt(value)?;
    let trimmed = s.trim_end_matches([')', '.', ',', ';']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strip a "doi:" label and resolver URL prefixes, then extract the
/// first registrant/suffix match, lower-cased. When nothing matches the
/// pattern, the cleaned remainder is lower-cased as a best effort.
pub fn normalize_doi(value: &Option<String>) -> Option<String> {
    let s = clean_opt(value)?;
    let s = DOI_LABEL_RE.replace(&s, "");
    let s = DOI_URL_RE.replace(&s, "");
    if let Some(caps) = DOI_RE.captures(&s) {
        return Some(caps[1].trim().to_lowercase());
    }
    let fallback = s.trim().to_lowercase();
    if fallback.is_empty() {
        None
    } else {
        Some(fallback)
    }
}

fn normalize_author_literal(literal: &str) -> String {
    let cleaned = clean_spaces(literal).unwrap_or_default();
    COMMA_SPACING_RE.replace_all(&cleaned, ", ").trim().to_string()
}

/// Conservative family/given split: only for "Family, Given" literals.
/// Names without a comma are left alone, since family/given order is
/// ambiguous in several scripts.
fn try_split_family_given(literal: &str) -> (Option<String>, Option<String>) {
    match literal.split_once(',') {
        Some((family, given)) => {
            let family = family.trim();
            let given = given.trim();
            (
                (!family.is_empty()).then(|| family.to_string()),
                (!given.is_empty()).then(|| given.to_string()),
            )
        }
        None => (None, None),
    }
}

/// Clean literals, drop empties, de-duplicate case-insensitively (first
/// occurrence wins), and fill in a structured split when it can be done
/// with confidence.
pub fn normalize_authors(authors: &[PersonName]) -> Vec<PersonName> {
    let mut out: Vec<PersonName> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for author in authors {
        let literal = normalize_author_literal(&author.literal);
        if literal.is_empty() {
            continue;
        }
        let key = literal.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let (mut family, mut given) = (author.family.clone(), author.given.clone());
        if family.is_none() && given.is_none() {
            (family, given) = try_split_family_given(&literal);
        }
        out.push(PersonName {
            literal,
            family,
            given,
            role: author.role,
        });
    }
    out
}

/// Normalize one record in place. With `mark_dirty`, the dirty flag is
/// set only when normalization actually changed something; load-time
/// normalization runs without it so freshly parsed records stay clean.
pub fn normalize_record(record: &mut Record, mark_dirty: bool) {
    let before = if mark_dirty {
        Some(record.snapshot())
    } else {
        None
    };

    record.title = normalize_title(&record.title);
    record.title_alt = normalize_title(&record.title_alt);

    record.container_title = normalize_container(&record.container_title);
    record.container_title_alt = normalize_container(&record.container_title_alt);

    record.pages = normalize_pages(&record.pages);
    record.url = normalize_url(&record.url);
    record.doi = normalize_doi(&record.doi);

    record.publisher = clean_opt(&record.publisher);
    record.institution = clean_opt(&record.institution);
    record.volume = clean_opt(&record.volume);
    record.issue = clean_opt(&record.issue);
    record.language = clean_opt(&record.language);

    record.authors = normalize_authors(&record.authors);

    // Raw tag values get the same whitespace cleanup, tags untouched.
    for value in record.raw_fields.values_mut() {
        match value {
            RawValue::One(v) => *v = clean_spaces(v).unwrap_or_default(),
            RawValue::Many(vs) => {
                for v in vs {
                    *v = clean_spaces(v).unwrap_or_default();
                }
            }
        }
    }

    if let Some(before) = before {
        if before != record.snapshot() {
            record.dirty = true;
        }
    }
}

pub fn normalize_records(records: &mut [Record], mark_dirty: bool) {
    for record in records {
        normalize_record(record, mark_dirty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblioref_model::PersonName;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn whitespace_collapses_and_empty_becomes_absent() {
        assert_eq!(normalize_container(&s("  A\u{00a0} journal \t name ")), s("A journal name"));
        assert_eq!(normalize_container(&s("   ")), None);
        assert_eq!(normalize_container(&None), None);
    }

    #[test]
    fn title_sheds_enclosing_quotes() {
        assert_eq!(normalize_title(&s("\u{201c}A Title\u{201d}")), s("A Title"));
        assert_eq!(normalize_title(&s("'quoted'")), s("quoted"));
        assert_eq!(normalize_title(&s("\u{300c}제목\u{300d}")), s("제목"));
    }

    #[test]
    fn pages_vectors() {
        assert_eq!(normalize_pages(&s("pp. 12 \u{2013} 20")), s("12-20"));
        assert_eq!(normalize_pages(&s("100")), s("100"));
        assert_eq!(normalize_pages(&s("p.55")), s("55"));
        assert_eq!(normalize_pages(&s("e1042")), s("e1042"));
        assert_eq!(normalize_pages(&s("pp.")), None);
    }

    #[test]
    fn doi_vectors() {
        assert_eq!(normalize_doi(&s("DOI: 10.1000/XYZ123")), s("10.1000/xyz123"));
        assert_eq!(
            normalize_doi(&s("https://doi.org/10.1234/ABC.DEF")),
            s("10.1234/abc.def")
        );
        assert_eq!(
            normalize_doi(&s("https://dx.doi.org/10.1234/abc")),
            s("10.1234/abc")
        );
        // Best-effort fallback keeps the cleaned remainder, lower-cased.
        assert_eq!(normalize_doi(&s("Not A DOI")), s("not a doi"));
    }

    #[test]
    fn url_sheds_trailing_punctuation() {
        assert_eq!(
            normalize_url(&s("https://example.org/paper).,")),
            s("https://example.org/paper")
        );
    }

    #[test]
    fn authors_deduplicate_and_split_conservatively() {
        let authors = vec![
            PersonName::from_literal("Kim ,  Minsoo"),
            PersonName::from_literal("kim, minsoo"),
            PersonName::from_literal("   "),
            PersonName::from_literal("홍길동"),
        ];
        let out = normalize_authors(&authors);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].literal, "Kim, Minsoo");
        assert_eq!(out[0].family.as_deref(), Some("Kim"));
        assert_eq!(out[0].given.as_deref(), Some("Minsoo"));
        // No comma, no split.
        assert_eq!(out[1].literal, "홍길동");
        assert!(out[1].family.is_none());
    }

    #[test]
    fn idempotent_on_a_messy_record() {
        let mut rec = Record::new(
            s("  \u{201c}A   Title\u{201d} "),
            Some(2020),
            vec![PersonName::from_literal("Kim ,Minsoo")],
            s(" Journal  of\u{00a0}Things "),
        );
        rec.pages = s("pp. 12 \u{2013} 20");
        rec.doi = s("DOI: 10.1000/XYZ123");
        rec.url = s("https://example.org/x).");

        normalize_record(&mut rec, false);
        let once = rec.snapshot();
        normalize_record(&mut rec, false);
        assert_eq!(once, rec.snapshot());
        assert_eq!(rec.title, s("A Title"));
        assert_eq!(rec.pages, s("12-20"));
        assert_eq!(rec.doi, s("10.1000/xyz123"));
    }

    #[test]
    fn dirty_marking_only_on_real_change() {
        let mut clean = Record::new(s("Tidy"), Some(2020), vec![], s("Journal"));
        normalize_record(&mut clean, true);
        assert!(!clean.dirty);

        let mut messy = Record::new(s("  Messy  title "), Some(2020), vec![], None);
        normalize_record(&mut messy, true);
        assert!(messy.dirty);

        let mut loaded = Record::new(s("  Messy  title "), Some(2020), vec![], None);
        normalize_record(&mut loaded, false);
        assert!(!loaded.dirty);
    }
}
