//! Validation issue taxonomy.

use serde::{Deserialize, Serialize};

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
        }
    }
}

/// One validation finding for a record (or for a whole file, when
/// `record_id` is absent).
///
/// Issues are always regenerated wholesale per validation pass, never
/// patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// Field name, or a composite like "volume/issue".
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Machine-readable category, e.g. "missing_required", "bad_format".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        field: impl Into<String>,
        message: impl Into<String>,
        record_id: Option<String>,
        code: &str,
    ) -> Self {
        Issue {
            severity,
            field: field.into(),
            message: message.into(),
            record_id,
            code: Some(code.to_string()),
            suggestions: Vec::new(),
        }
    }
}
