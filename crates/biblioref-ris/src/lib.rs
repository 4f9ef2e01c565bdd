//! RIS tag-block parsing and lossless serialization for BiblioRef.
//!
//! RIS is a line-oriented export format: one `TAG  - value` line per field,
//! records delimited by a `TY` begin tag and an `ER` end tag. Real exports
//! are messy (mixed encodings, stray lines, repeated and continued tags),
//! so parsing here never fails on data shape: garbage lines are
//! skipped, truncated records are still emitted, and every tag occurrence
//! is retained in the record's raw field bag.
//!
//! The main entry points are:
//! - [`parse_ris_file`] / [`parse_ris_text`]: bytes → [`Record`]s
//! - [`write_ris`] / [`record_to_ris_lines`]: [`Record`]s → tag lines,
//!   lossless for tags the canonical fields don't cover
//!
//! [`Record`]: biblioref_model::Record

pub mod encoding;
pub mod error;
pub mod parser;
pub mod writer;

pub use encoding::read_text_guess;
pub use error::{Error, Result};
pub use parser::{parse_ris_file, parse_ris_text};
pub use writer::{record_to_ris_lines, write_ris};
