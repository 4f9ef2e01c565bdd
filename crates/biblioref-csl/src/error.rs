//! Error types for style handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for biblioref-csl operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read style {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed style description: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document contained no root element at all.
    #[error("empty style description")]
    EmptyDocument,
}
