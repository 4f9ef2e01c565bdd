//! Reference list formatting and sorting.
//!
//! The builtin formatter is author-date with two conventions chosen per
//! record language: East Asian punctuation (the default when no
//! language is set) and a Western APA-like shape. Style-file rendering
//! goes through [`BibliographyRenderer`], the seam for an external
//! rendering engine; this crate ships no renderer of its own.

use crate::error::{Error, Result};
use biblioref_csl::{CitationItem, records_to_items};
use biblioref_model::{Record, RecordType, SortMode};
use std::path::{Path, PathBuf};

/// Language codes formatted with East Asian conventions. Records with
/// no language at all get the East Asian shape too.
const EAST_ASIAN_LANGS: &[&str] = &["ko", "zh", "ja", "ko-kr", "zh-cn", "zh-tw", "zh-hk", "ja-jp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorMode {
    /// List every author.
    #[default]
    All,
    /// First author plus an et-al marker when three or more.
    EtAlThree,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// Show placeholders like "[연도?]" for missing fields.
    pub show_missing_markers: bool,
    pub include_doi: bool,
    pub include_url: bool,
    pub author_mode: AuthorMode,
    /// Locale handed to an external renderer.
    pub locale: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            show_missing_markers: true,
            include_doi: true,
            include_url: false,
            author_mode: AuthorMode::All,
            locale: "ko-KR".to_string(),
        }
    }
}

/// External rendering engine boundary: given a style file, a locale and
/// the normalized items, return one rendered entry per item in order.
pub trait BibliographyRenderer {
    fn render(
        &self,
        style_path: &Path,
        items: &[CitationItem],
        locale: &str,
    ) -> std::result::Result<Vec<String>, String>;
}

/// The closed set of formatting backends.
pub enum StyleFormatter {
    /// Builtin author-date formatter.
    Builtin,
    /// A style file rendered by an external engine.
    Csl {
        style_path: PathBuf,
        renderer: Box<dyn BibliographyRenderer>,
    },
}

impl StyleFormatter {
    pub fn format_list(&self, records: &[Record], opts: &FormatOptions) -> Result<String> {
        match self {
            StyleFormatter::Builtin => Ok(records
                .iter()
                .map(|r| format_builtin(r, opts))
                .collect::<Vec<_>>()
                .join("\n")),
            StyleFormatter::Csl {
                style_path,
                renderer,
            } => {
                let items = records_to_items(records);
                let lines = renderer
                    .render(style_path, &items, &opts.locale)
                    .map_err(Error::Render)?;
                Ok(lines.join("\n"))
            }
        }
    }

    pub fn format_one(&self, record: &Record, opts: &FormatOptions) -> Result<String> {
        self.format_list(std::slice::from_ref(record), opts)
    }
}

fn norm_key(s: &str) -> String {
    s.replace('\u{00a0}', " ")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Sort records for a reference list. Keys are normalized so case and
/// punctuation don't scramble the order; the sort is stable for equal
/// keys. Missing years sort last.
pub fn sort_records(records: &[Record], mode: SortMode) -> Vec<Record> {
    let mut out: Vec<Record> = records.to_vec();
    let author = |r: &Record| norm_key(&r.first_author_display().unwrap_or_default());
    let title = |r: &Record| norm_key(r.title.as_deref().unwrap_or(""));
    let year = |r: &Record| r.year.unwrap_or(9999);

    match mode {
        SortMode::None => {}
        SortMode::AuthorYear => out.sort_by_key(|r| (author(r), year(r), title(r))),
        SortMode::YearAuthor => out.sort_by_key(|r| (year(r), author(r), title(r))),
        SortMode::Title => out.sort_by_key(|r| (title(r), year(r), author(r))),
    }
    out
}

fn is_western(language: Option<&str>) -> bool {
    match language.map(str::trim).filter(|s| !s.is_empty()) {
        Some(lang) => !EAST_ASIAN_LANGS.contains(&lang.to_lowercase().as_str()),
        None => false,
    }
}

fn clean(s: &str) -> String {
    s.replace('\u{00a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn missing(label: &str, opts: &FormatOptions) -> String {
    if opts.show_missing_markers {
        format!("[{label}?]")
    } else {
        String::new()
    }
}

fn join_nonempty(parts: &[String], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn author_names(record: &Record) -> Vec<String> {
    record
        .authors
        .iter()
        .map(|a| a.display().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn vol_issue(record: &Record) -> String {
    let v = clean(record.volume.as_deref().unwrap_or(""));
    let i = clean(record.issue.as_deref().unwrap_or(""));
    match (v.is_empty(), i.is_empty()) {
        (false, false) => format!("{v}({i})"),
        (false, true) => v,
        (true, false) => format!("({i})"),
        (true, true) => String::new(),
    }
}

fn year_part(record: &Record, opts: &FormatOptions, label: &str) -> String {
    match record.year {
        Some(y) => y.to_string(),
        None => missing(label, opts),
    }
}

fn title_part(record: &Record, opts: &FormatOptions, label: &str) -> String {
    match record.title.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(t) => t.to_string(),
        None => missing(label, opts),
    }
}

fn ea_authors(record: &Record, opts: &FormatOptions) -> String {
    let names = author_names(record);
    if names.is_empty() {
        return missing("저자", opts);
    }
    if opts.author_mode == AuthorMode::EtAlThree && names.len() >= 3 {
        return format!("{} 외", names[0]);
    }
    names.join(", ")
}

fn ea_container(record: &Record, opts: &FormatOptions) -> String {
    if let Some(ct) = record.container_title.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return ct.to_string();
    }
    let label = match record.record_type {
        RecordType::Thesis => "학위수여기관/출처",
        RecordType::Book | RecordType::BookChapter => "도서명/출처",
        RecordType::Report => "기관/출처",
        _ => "출처",
    };
    missing(label, opts)
}

fn doi_url_tail(record: &Record, opts: &FormatOptions, western: bool) -> String {
    let mut parts = Vec::new();
    if opts.include_doi {
        if let Some(doi) = record.doi.as_deref().filter(|s| !s.is_empty()) {
            if western {
                parts.push(format!("https://doi.org/{doi}"));
            } else {
                parts.push(format!("doi:{doi}"));
            }
        }
    }
    if opts.include_url {
        if let Some(url) = record.url.as_deref().filter(|s| !s.is_empty()) {
            parts.push(url.to_string());
        }
    }
    parts.join(" ")
}

fn clean_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(clean)
        .filter(|s| !s.is_empty())
}

fn format_east_asian(record: &Record, opts: &FormatOptions) -> String {
    let head = format!(
        "{}. ({}). {}.",
        ea_authors(record, opts),
        year_part(record, opts, "연도"),
        title_part(record, opts, "제목")
    );

    let vi = vol_issue(record);
    let pages = clean(record.pages.as_deref().unwrap_or(""));
    let mut tail: Vec<String> = Vec::new();
    match record.record_type {
        RecordType::JournalArticle => {
            tail.push(ea_container(record, opts));
            if !vi.is_empty() {
                tail.push(vi);
            }
            if pages.is_empty() {
                tail.push(missing("쪽", opts));
            } else {
                tail.push(pages);
            }
        }
        RecordType::Thesis | RecordType::Report => {
            tail.push(ea_container(record, opts));
            if let Some(inst) = clean_opt(&record.institution) {
                tail.push(inst);
            }
            if let Some(publ) = clean_opt(&record.publisher) {
                tail.push(publ);
            }
        }
        RecordType::Book | RecordType::BookChapter => {
            tail.push(ea_container(record, opts));
            if let Some(publ) = clean_opt(&record.publisher) {
                tail.push(publ);
            }
            if record.record_type == RecordType::BookChapter && !pages.is_empty() {
                tail.push(pages);
            }
        }
        _ => {
            tail.push(ea_container(record, opts));
            if !vi.is_empty() {
                tail.push(vi);
            }
            if !pages.is_empty() {
                tail.push(pages);
            }
        }
    }

    let tail = join_nonempty(&tail, ", ");
    let mut out = if tail.is_empty() {
        head
    } else {
        format!("{head} {tail}.")
    };
    let extra = doi_url_tail(record, opts, false);
    if !extra.is_empty() {
        out = format!("{out} {extra}");
    }
    clean(&out)
}

fn west_authors(record: &Record, opts: &FormatOptions) -> String {
    let names = author_names(record);
    if names.is_empty() {
        return missing("Author", opts);
    }
    if opts.author_mode == AuthorMode::EtAlThree && names.len() >= 3 {
        return format!("{} et al.", names[0]);
    }
    if names.len() == 1 {
        return names[0].clone();
    }
    format!("{}, & {}", names[..names.len() - 1].join(", "), names[names.len() - 1])
}

fn format_western(record: &Record, opts: &FormatOptions) -> String {
    let head = format!(
        "{} ({}). {}.",
        west_authors(record, opts),
        year_part(record, opts, "Year"),
        title_part(record, opts, "Title")
    );

    let vi = vol_issue(record);
    let pages = clean(record.pages.as_deref().unwrap_or(""));
    let mut tail: Vec<String> = Vec::new();
    match record.record_type {
        RecordType::JournalArticle => {
            if let Some(ct) = clean_opt(&record.container_title) {
                tail.push(ct);
            }
            if !vi.is_empty() {
                tail.push(vi);
            }
            if !pages.is_empty() {
                tail.push(pages);
            }
        }
        RecordType::Thesis => {
            let genre = "[Doctoral dissertation]";
            if let Some(inst) = clean_opt(&record.institution) {
                tail.push(format!("{genre} {inst}"));
            } else if let Some(publ) = clean_opt(&record.publisher) {
                tail.push(format!("{genre} {publ}"));
            } else {
                tail.push(genre.to_string());
            }
        }
        RecordType::Book | RecordType::BookChapter => {
            if record.record_type == RecordType::BookChapter {
                if let Some(ct) = clean_opt(&record.container_title) {
                    tail.push(format!("In {ct}"));
                    if !pages.is_empty() {
                        tail.push(format!("(pp. {pages})"));
                    }
                }
            }
            if let Some(publ) = clean_opt(&record.publisher) {
                tail.push(publ);
            }
        }
        RecordType::Report => {
            if let Some(inst) = clean_opt(&record.institution) {
                tail.push(inst);
            } else if let Some(publ) = clean_opt(&record.publisher) {
                tail.push(publ);
            }
        }
        _ => {
            if let Some(ct) = clean_opt(&record.container_title) {
                tail.push(ct);
            }
            if !vi.is_empty() {
                tail.push(vi);
            }
            if !pages.is_empty() {
                tail.push(pages);
            }
        }
    }

    let tail = join_nonempty(&tail, ", ");
    let mut out = if tail.is_empty() {
        head
    } else {
        format!("{head} {tail}.")
    };
    let extra = doi_url_tail(record, opts, true);
    if !extra.is_empty() {
        out = format!("{out} {extra}");
    }
    clean(&out)
}

/// Format one record with the builtin author-date conventions.
pub fn format_builtin(record: &Record, opts: &FormatOptions) -> String {
    if is_western(record.language.as_deref()) {
        format_western(record, opts)
    } else {
        format_east_asian(record, opts)
    }
}

/// Sort and format a whole reference list.
pub fn format_references(
    records: &[Record],
    formatter: &StyleFormatter,
    sort_mode: SortMode,
    opts: &FormatOptions,
) -> Result<String> {
    let sorted = sort_records(records, sort_mode);
    formatter.format_list(&sorted, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblioref_model::PersonName;

    fn journal_record(language: Option<&str>) -> Record {
        let mut rec = Record::new(
            Some("데이터 정규화 기법".to_string()),
            Some(2020),
            vec![
                PersonName::from_literal("홍길동"),
                PersonName::from_literal("김철수"),
            ],
            Some("한국데이터학회지".to_string()),
        );
        rec.record_type = RecordType::JournalArticle;
        rec.volume = Some("12".to_string());
        rec.issue = Some("3".to_string());
        rec.pages = Some("45-60".to_string());
        rec.language = language.map(str::to_string);
        rec
    }

    #[test]
    fn east_asian_journal_shape() {
        let rec = journal_record(None);
        let out = format_builtin(&rec, &FormatOptions::default());
        assert_eq!(
            out,
            "홍길동, 김철수. (2020). 데이터 정규화 기법. 한국데이터학회지, 12(3), 45-60."
        );
    }

    #[test]
    fn western_journal_shape_with_doi() {
        let mut rec = journal_record(Some("en"));
        rec.title = Some("Data Normalization".to_string());
        rec.authors = vec![
            PersonName::from_literal("Smith, J."),
            PersonName::from_literal("Doe, A."),
        ];
        rec.container_title = Some("Journal of Data".to_string());
        rec.doi = Some("10.1000/xyz".to_string());
        let out = format_builtin(&rec, &FormatOptions::default());
        assert_eq!(
            out,
            "Smith, J., & Doe, A. (2020). Data Normalization. Journal of Data, 12(3), 45-60. https://doi.org/10.1000/xyz"
        );
    }

    #[test]
    fn missing_markers_toggle() {
        let mut rec = journal_record(None);
        rec.year = None;
        rec.pages = None;
        let with = format_builtin(&rec, &FormatOptions::default());
        assert!(with.contains("[연도?]"));
        assert!(with.contains("[쪽?]"));

        let opts = FormatOptions {
            show_missing_markers: false,
            ..Default::default()
        };
        let without = format_builtin(&rec, &opts);
        assert!(!without.contains('?'));
    }

    #[test]
    fn et_al_policy() {
        let mut rec = journal_record(None);
        rec.authors = vec![
            PersonName::from_literal("홍길동"),
            PersonName::from_literal("김철수"),
            PersonName::from_literal("이영희"),
        ];
        let opts = FormatOptions {
            author_mode: AuthorMode::EtAlThree,
            ..Default::default()
        };
        let out = format_builtin(&rec, &opts);
        assert!(out.starts_with("홍길동 외."));

        let mut west = rec.clone();
        west.language = Some("en".to_string());
        let out = format_builtin(&west, &opts);
        assert!(out.starts_with("홍길동 et al."));
    }

    #[test]
    fn thesis_shapes() {
        let mut rec = Record::new(
            Some("학위 논문 제목".to_string()),
            Some(2019),
            vec![PersonName::from_literal("박지민")],
            None,
        );
        rec.record_type = RecordType::Thesis;
        rec.institution = Some("서울대학교".to_string());
        let out = format_builtin(&rec, &FormatOptions::default());
        assert!(out.contains("서울대학교"));
        assert!(out.contains("[학위수여기관/출처?]"));

        rec.language = Some("en".to_string());
        rec.title = Some("A Thesis".to_string());
        let out = format_builtin(&rec, &FormatOptions::default());
        assert!(out.contains("[Doctoral dissertation] 서울대학교"));
    }

    #[test]
    fn sorting_modes() {
        let mut a = journal_record(None);
        a.title = Some("가나다".to_string());
        a.authors = vec![PersonName::from_literal("이영희")];
        a.year = Some(2021);
        let mut b = journal_record(None);
        b.title = Some("ABC study".to_string());
        b.authors = vec![PersonName::from_literal("김철수")];
        b.year = Some(2018);
        let mut c = journal_record(None);
        c.title = Some("Older work".to_string());
        c.authors = vec![PersonName::from_literal("김철수")];
        c.year = None;

        let records = vec![a.clone(), b.clone(), c.clone()];

        let by_author = sort_records(&records, SortMode::AuthorYear);
        assert_eq!(by_author[0].id, b.id);
        assert_eq!(by_author[1].id, c.id);
        assert_eq!(by_author[2].id, a.id);

        let by_year = sort_records(&records, SortMode::YearAuthor);
        assert_eq!(by_year[0].id, b.id);
        assert_eq!(by_year[1].id, a.id);
        // Missing year sorts last.
        assert_eq!(by_year[2].id, c.id);

        let untouched = sort_records(&records, SortMode::None);
        assert_eq!(untouched[0].id, a.id);
    }

    struct FakeRenderer;
    impl BibliographyRenderer for FakeRenderer {
        fn render(
            &self,
            _style_path: &Path,
            items: &[CitationItem],
            locale: &str,
        ) -> std::result::Result<Vec<String>, String> {
            Ok(items
                .iter()
                .map(|i| format!("[{locale}] {}", i.title.clone().unwrap_or_default()))
                .collect())
        }
    }

    #[test]
    fn csl_variant_delegates_to_renderer() {
        let formatter = StyleFormatter::Csl {
            style_path: PathBuf::from("/styles/apa.csl"),
            renderer: Box::new(FakeRenderer),
        };
        let records = vec![journal_record(None)];
        let out = formatter
            .format_list(&records, &FormatOptions::default())
            .unwrap();
        assert_eq!(out, "[ko-KR] 데이터 정규화 기법");
    }
}
