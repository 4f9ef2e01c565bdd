//! BiblioRef pipeline.
//!
//! Everything between parsing and display lives here: in-place record
//! normalization, validation into Issues, the correction batch round
//! trip, project load/save with statistics, reference list sorting and
//! formatting, and the persisted user configuration.
//!
//! All operations are synchronous transformations over in-memory
//! collections. Data-shape defects become Issues or per-row batch
//! errors; only environment failures (missing files and folders)
//! surface as [`Error`].

pub mod config;
pub mod corrections;
pub mod error;
pub mod format;
pub mod normalize;
pub mod project;
pub mod validate;

pub use config::{AppConfig, load_config, save_config};
pub use corrections::{
    ApplyOutcome, EDITABLE_FIELDS, apply_corrections_csv, generate_corrections_csv,
};
pub use error::{Error, Result};
pub use format::{
    AuthorMode, BibliographyRenderer, FormatOptions, StyleFormatter, format_builtin,
    format_references, sort_records,
};
pub use normalize::{normalize_record, normalize_records};
pub use project::{
    LoadStats, SaveStats, load_project, refresh_project, save_project, scan_folder,
};
pub use validate::{filter_issues_for_fields, validate_record, validate_records};
