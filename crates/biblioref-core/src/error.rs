//! Error types for pipeline operations.
//!
//! Data-shape problems are never errors here: they become Issues or
//! per-row entries in a batch outcome. Only environment failures reach
//! this enum.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for biblioref-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("not a folder: {0}")]
    NotAFolder(PathBuf),

    #[error("corrections file not found: {0}")]
    CorrectionsNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ris(#[from] biblioref_ris::Error),

    #[error("render failed: {0}")]
    Render(String),
}
