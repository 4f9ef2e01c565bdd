//! End-to-end pipeline tests: folder load, validation statistics, the
//! correction round trip, and style-driven issue narrowing.

use biblioref_core::{
    apply_corrections_csv, filter_issues_for_fields, generate_corrections_csv, load_project,
    refresh_project, save_project,
};
use biblioref_csl::{StyleRegistry, editor_fields_for_variables};
use biblioref_model::{ProjectSettings, RecordType, Severity};
use std::path::Path;

const THREE_RECORDS: &str = "\
TY  - JOUR
TI  - Complete Article
AU  - Kim, Minsoo
JO  - Journal of Things
VL  - 3
SP  - 1
EP  - 10
PY  - 2020
ER  -

TY  - JOUR
TI  - No Year Yet
AU  - Lee, Young
JO  - Journal of Things
VL  - 1
SP  - 5
EP  - 9
ER  -

TY  - JOUR
TI  - Future Claims
AU  - Park, Jimin
JO  - Journal of Things
VL  - 2
SP  - 11
EP  - 20
PY  - 3050
ER  -
";

fn write_fixture(dir: &Path) {
    std::fs::write(dir.join("refs.ris"), THREE_RECORDS).unwrap();
}

#[test]
fn load_stats_and_year_validation() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let (project, stats) = load_project(dir.path(), ProjectSettings::default()).unwrap();
    assert_eq!(stats.files_found, 1);
    assert_eq!(stats.files_loaded, 1);
    assert_eq!(stats.records_loaded, 3);
    assert_eq!(stats.parse_errors, 0);
    assert!(project.issues.is_empty());

    let year_issues: Vec<_> = project
        .records
        .iter()
        .flat_map(|r| r.issues.iter())
        .filter(|i| i.field == "year")
        .collect();
    assert_eq!(year_issues.len(), 2);
    assert_eq!(
        year_issues
            .iter()
            .filter(|i| i.severity == Severity::Warn)
            .count(),
        1
    );
    assert_eq!(
        year_issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count(),
        1
    );
}

#[test]
fn correction_round_trip_persists_to_source_file() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let (mut project, _) = load_project(dir.path(), ProjectSettings::default()).unwrap();

    let no_year_id = project
        .records
        .iter()
        .find(|r| r.title.as_deref() == Some("No Year Yet"))
        .map(|r| r.id.clone())
        .unwrap();

    let csv_path = dir.path().join("corrections.csv");
    let rows = generate_corrections_csv(&project.records, &csv_path, false, true).unwrap();
    assert!(rows > 0);

    // Fill in the year cell for the record that is missing one, the way
    // a user would in a spreadsheet.
    let raw = std::fs::read_to_string(&csv_path).unwrap();
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    let edited: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with(&no_year_id) && line.contains(",year,") {
                line.replacen(",year,,,", ",year,,2005,", 1)
            } else {
                line.to_string()
            }
        })
        .collect();
    std::fs::write(&csv_path, edited.join("\n")).unwrap();

    let outcome = apply_corrections_csv(&mut project.records, &csv_path).unwrap();
    assert_eq!(outcome.changes_applied, 1);
    assert!(outcome.errors.is_empty());

    refresh_project(&mut project);
    let fixed = project.get_record(&no_year_id).unwrap();
    assert_eq!(fixed.year, Some(2005));
    assert!(!fixed.issues.iter().any(|i| i.field == "year"));

    let saved = save_project(&mut project, true).unwrap();
    assert_eq!(saved.files_touched, 1);

    let (reloaded, _) = load_project(dir.path(), ProjectSettings::default()).unwrap();
    let back = reloaded
        .records
        .iter()
        .find(|r| r.title.as_deref() == Some("No Year Yet"))
        .unwrap();
    assert_eq!(back.year, Some(2005));
}

#[test]
fn style_variables_narrow_editor_fields_and_issues() {
    let dir = tempfile::tempdir().unwrap();
    let style_path = dir.path().join("minimal.csl");
    std::fs::write(
        &style_path,
        r#"<style><info><title>Minimal Book Style</title></info><bibliography><layout>
            <text variable="title"/>
            <text variable="author"/>
            <text variable="issued"/>
            <choose>
                <if type="book"><text variable="publisher"/></if>
                <else><text variable="DOI"/></else>
            </choose>
        </layout></bibliography></style>"#,
    )
    .unwrap();

    let mut registry = StyleRegistry::new();

    // A book rendered by this style cares about the publisher.
    let vars = registry
        .variables_for(&style_path, RecordType::Book)
        .unwrap();
    let fields = editor_fields_for_variables(&vars);
    assert!(fields.contains("publisher"));
    assert!(!fields.contains("doi"));

    let mut book = biblioref_model::Record::new(
        Some("A Book".to_string()),
        Some(2020),
        vec![biblioref_model::PersonName::from_literal("Kim, Minsoo")],
        None,
    );
    book.record_type = RecordType::Book;
    let issues = biblioref_core::validate_record(&mut book);
    let kept = filter_issues_for_fields(&issues, &fields);
    assert!(kept.iter().any(|i| i.field == "publisher"));

    // A journal article under the same style resolves to DOI instead,
    // so the publisher issue would be filtered away.
    let vars = registry
        .variables_for(&style_path, RecordType::JournalArticle)
        .unwrap();
    let fields = editor_fields_for_variables(&vars);
    assert!(fields.contains("doi"));
    assert!(!fields.contains("publisher"));
    let kept = filter_issues_for_fields(&issues, &fields);
    assert!(!kept.iter().any(|i| i.field == "publisher"));

    // The registry lists the style under its metadata title.
    registry.discover(&[dir.path().to_path_buf()]);
    assert!(registry.all().any(|s| s.name == "Minimal Book Style"));
}
