//! Error types for the UMUD catalog.
//!
//! - [`FieldError`] - a single field-level validation failure
//! - [`ValidationFailure`] - every field error of one rejected record
//! - [`StoreError`] - document store errors
//! - [`CatalogError`] - query engine errors
//! - [`ExportError`] - CSV / JSON export errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Validation Errors
// =============================================================================

/// The rule a field value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// Required field absent, null, blank or empty.
    Missing,
    /// Value has a shape that cannot be coerced (e.g. an object for a number).
    WrongType,
    /// Value (or a set member) is outside the closed vocabulary.
    NotInVocabulary,
    /// Number outside the inclusive bounds of the field.
    OutOfRange,
    /// String does not match the field pattern.
    InvalidFormat,
    /// Number passes the range but is physiologically implausible.
    Implausible,
    /// String longer than the field allows.
    TooLong,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Missing => "missing",
            Rule::WrongType => "wrongType",
            Rule::NotInVocabulary => "notInVocabulary",
            Rule::OutOfRange => "outOfRange",
            Rule::InvalidFormat => "invalidFormat",
            Rule::Implausible => "implausible",
            Rule::TooLong => "tooLong",
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{field} ({}): {message}", .rule.as_str())]
pub struct FieldError {
    /// Persisted name of the offending field.
    pub field: String,
    /// Rule that failed.
    pub rule: Rule,
    /// Raw value as submitted (`null` when missing).
    pub value: Value,
    /// Human-readable explanation.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, rule: Rule, value: &Value, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            rule,
            value: value.clone(),
            message: message.into(),
        }
    }
}

/// All field errors of one rejected record.
#[derive(Debug, Clone, Error)]
#[error("Validation failed with {} error(s): {}", .0.len(), summarize(.0))]
pub struct ValidationFailure(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record with the same dataset name already exists.
    #[error("Dataset already exists: {0}")]
    Duplicate(String),

    /// The store cannot serve requests.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors from the catalog query engine and submissions.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Snapshot could not be read.
    #[error("Catalog store error: {0}")]
    Store(#[from] StoreError),

    /// An operation that needs a known field was given an unknown one.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A histogram was asked for over a field that does not hold numbers.
    #[error("Field is not numeric: {0}")]
    NotNumeric(String),

    /// A histogram bin count outside `1..=catalog::MAX_BINS`.
    #[error("Invalid bin count: {0}")]
    InvalidBins(usize),

    /// A submission did not pass validation.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing download artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writer produced non UTF-8 output.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A blocking task did not finish.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for catalog queries.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_conversion_chain() {
        // StoreError -> CatalogError
        let store_err = StoreError::Duplicate("DeepACSA_2022".into());
        let catalog_err: CatalogError = store_err.into();
        assert!(catalog_err.to_string().contains("DeepACSA_2022"));

        // CatalogError -> ServerError
        let server_err: ServerError = CatalogError::UnknownField("colour".into()).into();
        assert!(server_err.to_string().contains("colour"));

        // ValidationFailure -> CatalogError
        let failure = ValidationFailure(vec![FieldError::new("year", Rule::InvalidFormat, &json!("22"), "expected YYYY")]);
        let catalog_err: CatalogError = failure.into();
        assert!(matches!(catalog_err, CatalogError::Invalid(ref f) if f.0.len() == 1));
        assert!(catalog_err.to_string().contains("year"));
    }

    #[test]
    fn test_field_error_format() {
        let err = FieldError::new("license", Rule::NotInVocabulary, &json!("MIT-ish"), "not a known license");
        let msg = err.to_string();
        assert!(msg.contains("license"));
        assert!(msg.contains("notInVocabulary"));
        assert!(msg.contains("not a known license"));
    }

    #[test]
    fn test_field_error_serialization() {
        let err = FieldError::new("participantHeightCm", Rule::Implausible, &json!(30), "below 50");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["field"], "participantHeightCm");
        assert_eq!(json["rule"], "implausible");
        assert_eq!(json["value"], 30);
    }

    #[test]
    fn test_validation_failure_lists_every_error() {
        let failure = ValidationFailure(vec![
            FieldError::new("authors", Rule::Missing, &Value::Null, "required"),
            FieldError::new("doi", Rule::InvalidFormat, &json!("11.1/x"), "not a DOI"),
        ]);
        let msg = failure.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("authors"));
        assert!(msg.contains("doi"));
    }
}
