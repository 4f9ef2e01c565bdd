//! Citation item adapter: the style-neutral shape handed to an external
//! rendering engine. Field names follow that engine's vocabulary, dates
//! are nested numeric tuples, names are structured when a family/given
//! split exists and literal otherwise. Absent fields are omitted rather
//! than serialized as empty strings.

use crate::variables::csl_type_for;
use biblioref_model::{PersonName, Record};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitationName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

/// A date as nested numeric parts: `[[year]]`, `[[year, month]]` or
/// `[[year, month, day]]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssuedDate {
    #[serde(rename = "date-parts")]
    pub date_parts: Vec<Vec<i32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "title-short", skip_serializing_if = "Option::is_none")]
    pub title_short: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<CitationName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<IssuedDate>,
    #[serde(rename = "container-title", skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(rename = "DOI", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn name_to_citation(name: &PersonName) -> Option<CitationName> {
    let family = name.family.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let given = name.given.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if family.is_some() || given.is_some() {
        return Some(CitationName {
            family: family.map(str::to_string),
            given: given.map(str::to_string),
            literal: None,
        });
    }
    let literal = name.display();
    if literal.is_empty() {
        None
    } else {
        Some(CitationName {
            literal: Some(literal),
            ..Default::default()
        })
    }
}

fn issued_date(record: &Record) -> Option<IssuedDate> {
    let year = record.year?;
    let mut parts = vec![year];
    // Month and day only when plausible; a bare year is common.
    if let Some(month) = record.month.filter(|m| (1..=12).contains(m)) {
        parts.push(month);
        if let Some(day) = record.day.filter(|d| (1..=31).contains(d)) {
            parts.push(day);
        }
    }
    Some(IssuedDate {
        date_parts: vec![parts],
    })
}

/// Shape one record for the external renderer.
pub fn record_to_item(record: &Record) -> CitationItem {
    let publisher = non_empty(&record.publisher);
    let institution = non_empty(&record.institution);
    CitationItem {
        id: record.id.clone(),
        item_type: csl_type_for(record.record_type).to_string(),
        title: non_empty(&record.title),
        title_short: non_empty(&record.title_alt),
        author: record.authors.iter().filter_map(name_to_citation).collect(),
        issued: issued_date(record),
        container_title: non_empty(&record.container_title),
        volume: non_empty(&record.volume),
        issue: non_empty(&record.issue),
        page: non_empty(&record.pages),
        doi: non_empty(&record.doi),
        url: non_empty(&record.url),
        // Theses and reports often carry only an institution; renderers
        // expect it in the publisher slot too when that is empty.
        publisher: publisher.or_else(|| institution.clone()),
        institution,
        language: non_empty(&record.language),
    }
}

/// Shape a whole list, preserving document order.
pub fn records_to_items(records: &[Record]) -> Vec<CitationItem> {
    records.iter().map(record_to_item).collect()
}
