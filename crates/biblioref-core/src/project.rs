//! Project pipeline: scan a folder for bibliography files, parse them
//! into a [`Project`], and write edited records back to their source
//! files. Load and save both report structured statistics so callers
//! can surface partial success.

use crate::error::{Error, Result};
use crate::normalize::normalize_records;
use crate::validate::validate_records;
use biblioref_model::{Issue, Project, ProjectSettings, Record, Severity};
use biblioref_ris::{parse_ris_file, write_ris};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub files_found: usize,
    pub files_loaded: usize,
    pub records_loaded: usize,
    pub parse_errors: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveStats {
    pub files_touched: usize,
    pub records_written: usize,
    pub skipped_records_no_source: usize,
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Collect bibliography files under a folder, sorted case-insensitively
/// by full path. Hidden files and folders are skipped unless asked for.
pub fn scan_folder(folder: &Path, recursive: bool, include_hidden: bool) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(Error::FolderNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(Error::NotAFolder(folder.to_path_buf()));
    }

    let walker = if recursive {
        WalkDir::new(folder)
    } else {
        WalkDir::new(folder).max_depth(1)
    };

    let mut paths: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| include_hidden || !is_hidden(path, folder))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ris"))
        })
        .collect();

    paths.sort_by_key(|p| p.to_string_lossy().to_lowercase());
    Ok(paths)
}

/// Scan, parse, normalize and validate a folder of bibliography files.
///
/// A file that fails to read is not fatal: it is counted in
/// `parse_errors` and recorded as a project-level Issue, and loading
/// continues with the remaining files.
pub fn load_project(folder: &Path, settings: ProjectSettings) -> Result<(Project, LoadStats)> {
    let root = folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf());
    let mut project = Project {
        folder: root.to_string_lossy().into_owned(),
        settings,
        ..Default::default()
    };

    let paths = scan_folder(&root, true, false)?;
    let mut stats = LoadStats {
        files_found: paths.len(),
        ..Default::default()
    };

    for path in &paths {
        match parse_ris_file(path) {
            Ok((records, encoding)) => {
                tracing::debug!(
                    path = %path.display(),
                    records = records.len(),
                    encoding,
                    "loaded bibliography file"
                );
                stats.files_loaded += 1;
                stats.records_loaded += records.len();
                project.records.extend(records);
            }
            Err(err) => {
                stats.parse_errors += 1;
                project.issues.push(Issue::new(
                    Severity::Error,
                    "file",
                    format!("failed to load {}: {err}", path.display()),
                    None,
                    "file_parse_error",
                ));
            }
        }
    }

    normalize_records(&mut project.records, false);
    validate_records(&mut project.records);

    tracing::info!(
        folder = %root.display(),
        files = stats.files_loaded,
        records = stats.records_loaded,
        parse_errors = stats.parse_errors,
        "project loaded"
    );
    Ok((project, stats))
}

/// Re-run normalization and validation after bulk edits.
pub fn refresh_project(project: &mut Project) {
    normalize_records(&mut project.records, false);
    validate_records(&mut project.records);
}

/// Write project records back to their source files.
///
/// Strategy is a file-level rewrite: with `only_dirty`, a file is still
/// rewritten in full when any of its records is dirty. Records without
/// a source file are skipped and counted. Dirty flags are cleared once
/// their file has been written.
pub fn save_project(project: &mut Project, only_dirty: bool) -> Result<SaveStats> {
    let mut stats = SaveStats {
        skipped_records_no_source: project
            .records
            .iter()
            .filter(|r| r.source_file.is_none())
            .count(),
        ..Default::default()
    };

    let mut grouped: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, record) in project.records.iter().enumerate() {
        if let Some(src) = &record.source_file {
            grouped.entry(src.clone()).or_default().push(idx);
        }
    }

    let backup = project.settings.backup_on_save;
    for (src, indices) in grouped {
        if only_dirty && !indices.iter().any(|&i| project.records[i].dirty) {
            continue;
        }

        let file_records: Vec<Record> = indices
            .iter()
            .map(|&i| project.records[i].clone())
            .collect();
        write_ris(Path::new(&src), &file_records, backup)?;

        stats.files_touched += 1;
        stats.records_written += file_records.len();
        for &i in &indices {
            project.records[i].dirty = false;
        }
    }

    tracing::info!(
        files = stats.files_touched,
        records = stats.records_written,
        skipped = stats.skipped_records_no_source,
        "project saved"
    );
    Ok(stats)
}
