//! Error types for RIS file I/O.
//!
//! Parsing itself is total over its input space; only environment
//! failures (unreadable or unwritable files) surface as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for biblioref-ris operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to back up {path} to {backup}: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        source: std::io::Error,
    },
}
