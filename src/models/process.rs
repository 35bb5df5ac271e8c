//! Processing request DTOs

use serde::Deserialize;
use validator::Validate;

/// Request to process a single raw file
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFileRequest {
    #[validate(length(min = 1, max = 1024, message = "Filename is required"))]
    #[validate(custom(function = "validate_filename"))]
    pub filename: String,
    /// Falls back to the configured sensitive fields
    pub sensitive_fields: Option<Vec<String>>,
    /// Full object key overriding `{base}/raw/{filename}`
    pub raw_path: Option<String>,
}

/// Request to process the whole raw directory
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBatchRequest {
    pub sensitive_fields: Option<Vec<String>>,
    #[validate(range(min = 1, max = 64, message = "maxWorkers must be between 1 and 64"))]
    pub max_workers: Option<usize>,
}

fn validate_filename(name: &str) -> Result<(), validator::ValidationError> {
    if name.contains('/') || name == "." || name == ".." {
        let mut err = validator::ValidationError::new("invalid_filename");
        err.message = Some("Filename must be a plain object name without '/'".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_request_validation() {
        let ok: ProcessFileRequest =
            serde_json::from_str(r#"{"filename": "a.csv", "sensitiveFields": ["name"]}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.sensitive_fields, Some(vec!["name".to_string()]));

        let empty: ProcessFileRequest = serde_json::from_str(r#"{"filename": ""}"#).unwrap();
        assert!(empty.validate().is_err());

        let nested: ProcessFileRequest = serde_json::from_str(r#"{"filename": "x/a.csv"}"#).unwrap();
        assert!(nested.validate().is_err());
    }

    #[test]
    fn test_batch_request_worker_bounds() {
        let zero: ProcessBatchRequest = serde_json::from_str(r#"{"maxWorkers": 0}"#).unwrap();
        assert!(zero.validate().is_err());

        let many: ProcessBatchRequest = serde_json::from_str(r#"{"maxWorkers": 65}"#).unwrap();
        assert!(many.validate().is_err());

        let unset: ProcessBatchRequest = serde_json::from_str("{}").unwrap();
        assert!(unset.validate().is_ok());
    }
}
