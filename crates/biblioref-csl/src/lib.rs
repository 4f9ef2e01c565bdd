//! Style description handling for BiblioRef.
//!
//! A citation style is an XML-like tree of attribute-carrying elements.
//! This crate consumes such trees read-only, for three purposes:
//!
//! - [`variables_for_type`]: the style variable resolver. It answers which
//!   semantic fields a style actually renders for a given record type, and
//!   is used to narrow editor fields and validation issues to what matters
//!   under the selected style.
//! - [`StyleRegistry`]: discovery of style files across folders, with
//!   display names read from the style's own metadata, plus the parse and
//!   resolution caches keyed by normalized absolute path.
//! - [`CitationItem`]: the normalized, style-neutral item handed to the
//!   external rendering engine (CSL-JSON vocabulary, nested date tuples,
//!   structured-or-literal names).
//!
//! Malformed style descriptions degrade gracefully: the resolver yields an
//! empty variable set and discovery skips unreadable files.

pub mod error;
pub mod item;
pub mod registry;
pub mod tree;
pub mod variables;

pub use error::{Error, Result};
pub use item::{CitationItem, CitationName, IssuedDate, record_to_item, records_to_items};
pub use registry::{StyleKind, StyleRef, StyleRegistry};
pub use tree::{StyleNode, parse_style_tree};
pub use variables::{
    csl_type_for, editor_fields_for_variables, variables_for_record_type, variables_for_type,
};
