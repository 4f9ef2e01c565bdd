//! Canonical bibliographic record model for BiblioRef.
//!
//! This crate defines the neutral, app-level representation that every
//! other component works against:
//!
//! - [`Record`]: one bibliographic entry with typed canonical fields and a
//!   lossless [`RawValue`] tag bag alongside them
//! - [`PersonName`]: a contributor with both literal and structured forms
//! - [`Issue`]: one validation finding with severity and a machine code
//! - [`Project`]: a loaded folder of records plus its settings
//!
//! Record identity is a content-derived fingerprint (see [`record_id`]),
//! stable across re-parses of unchanged text and independent of file paths,
//! so correction batches can target records reliably.

pub mod issue;
pub mod project;
pub mod record;

pub use issue::{Issue, Severity};
pub use project::{Project, ProjectSettings, SortMode};
pub use record::{PersonName, PersonRole, RawValue, Record, RecordType, SourceFormat, record_id};
