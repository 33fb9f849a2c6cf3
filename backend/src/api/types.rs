//! REST API response types.
//!
//! Records are returned in their persisted camelCase form, so a dashboard
//! can use them as-is.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::DatasetMetadataRecord;

/// Response to `POST /api/validate` and `POST /api/datasets`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Identifier of this request, quoted in the activity feed
    pub submission_id: String,

    /// "valid", "stored" or "invalid"
    pub status: String,

    /// Document id in the store (stored submissions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Normalized record (valid submissions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DatasetMetadataRecord>,

    /// Every field error (invalid submissions only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl SubmissionResponse {
    pub fn valid(submission_id: Uuid, record: DatasetMetadataRecord) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: "valid".to_string(),
            id: None,
            record: Some(record),
            errors: Vec::new(),
        }
    }

    pub fn stored(submission_id: Uuid, id: String, record: DatasetMetadataRecord) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: "stored".to_string(),
            id: Some(id),
            record: Some(record),
            errors: Vec::new(),
        }
    }

    pub fn invalid(submission_id: Uuid, errors: Vec<FieldError>) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: "invalid".to_string(),
            id: None,
            record: None,
            errors,
        }
    }
}

/// Response to `GET /api/datasets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetsResponse {
    /// Number of matching records
    pub total: usize,
    pub records: Vec<DatasetMetadataRecord>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rule;
    use crate::fixtures::sample_record;

    #[test]
    fn test_invalid_response_shape() {
        let errors = vec![FieldError::new("license", Rule::NotInVocabulary, &json!("MIT-ish"), "not accepted")];
        let json = serde_json::to_value(SubmissionResponse::invalid(Uuid::new_v4(), errors)).unwrap();

        assert_eq!(json["status"], "invalid");
        assert_eq!(json["errors"][0]["field"], "license");
        assert_eq!(json["errors"][0]["rule"], "notInVocabulary");
        assert!(json.get("record").is_none());
        assert_eq!(json["submissionId"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_stored_response_shape() {
        let response = SubmissionResponse::stored(Uuid::new_v4(), "deepacsa-2022".into(), sample_record());
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["status"], "stored");
        assert_eq!(json["id"], "deepacsa-2022");
        assert_eq!(json["record"]["name"], "DeepACSA_2022");
        assert!(json.get("errors").is_none());
    }
}
