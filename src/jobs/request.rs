//! # Job Submission Requests
//!
//! Shape validation for incoming generation/refresh requests. A request that
//! fails validation is rejected synchronously and never creates a job record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{RankForgeError, Result};

/// What the pipeline should do with the target keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Produce a new article from scratch
    Generate,
    /// Re-optimize existing content
    Refresh,
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

impl std::str::FromStr for JobMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "generate" => Ok(Self::Generate),
            "refresh" => Ok(Self::Refresh),
            _ => Err(format!("Invalid job mode: {s}")),
        }
    }
}

/// A validated submission, absorbed into execution rather than persisted on
/// its own. The full original payload rides along for the pipeline, which
/// owns the interpretation of auxiliary fields (model selector, existing
/// content, data blobs).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub keyword: String,
    pub mode: JobMode,
    pub request_id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_content: Option<String>,
    /// The raw submission body, untouched
    pub payload: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
}

impl JobRequest {
    /// Validate a raw JSON submission into a request.
    ///
    /// Required fields: `keyword` (non-empty string), `mode`
    /// (`generate` | `refresh`), `requestId`, `clientId`. Everything else is
    /// carried opaquely in `payload`.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let body = payload
            .as_object()
            .ok_or_else(|| RankForgeError::Validation("request body must be a JSON object".into()))?;

        let keyword = required_string(body, "keyword")?;
        let mode = required_string(body, "mode")?
            .parse::<JobMode>()
            .map_err(RankForgeError::Validation)?;
        let request_id = required_string(body, "requestId")?;
        let client_id = required_string(body, "clientId")?;

        let model = optional_string(body, "model");
        let existing_content = optional_string(body, "existingContent");

        Ok(Self {
            keyword,
            mode,
            request_id,
            client_id,
            model,
            existing_content,
            payload,
            submitted_at: Utc::now(),
        })
    }
}

fn required_string(body: &serde_json::Map<String, Value>, field: &str) -> Result<String> {
    match body.get(field).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        Some(_) => Err(RankForgeError::Validation(format!(
            "field '{field}' must be a non-empty string"
        ))),
        None => Err(RankForgeError::Validation(format!(
            "missing required field '{field}'"
        ))),
    }
}

fn optional_string(body: &serde_json::Map<String, Value>, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_generate_request() {
        let request = JobRequest::from_payload(json!({
            "keyword": "ergonomic chairs",
            "mode": "generate",
            "requestId": "r1",
            "clientId": "c1",
            "model": "fast",
            "serpSnapshot": {"results": []},
        }))
        .unwrap();

        assert_eq!(request.keyword, "ergonomic chairs");
        assert_eq!(request.mode, JobMode::Generate);
        assert_eq!(request.model.as_deref(), Some("fast"));
        assert!(request.existing_content.is_none());
        assert_eq!(request.payload["serpSnapshot"]["results"], json!([]));
    }

    #[test]
    fn test_refresh_carries_existing_content() {
        let request = JobRequest::from_payload(json!({
            "keyword": "ergonomic chairs",
            "mode": "refresh",
            "requestId": "r2",
            "clientId": "c1",
            "existingContent": "<p>old copy</p>",
        }))
        .unwrap();

        assert_eq!(request.mode, JobMode::Refresh);
        assert_eq!(request.existing_content.as_deref(), Some("<p>old copy</p>"));
    }

    #[test]
    fn test_missing_fields_rejected() {
        for missing in ["keyword", "mode", "requestId", "clientId"] {
            let mut body = json!({
                "keyword": "k",
                "mode": "generate",
                "requestId": "r",
                "clientId": "c",
            });
            body.as_object_mut().unwrap().remove(missing);

            let err = JobRequest::from_payload(body).unwrap_err();
            assert!(
                err.to_string().contains(missing),
                "expected error naming '{missing}', got: {err}"
            );
        }
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let result = JobRequest::from_payload(json!({
            "keyword": "   ",
            "mode": "generate",
            "requestId": "r",
            "clientId": "c",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = JobRequest::from_payload(json!({
            "keyword": "k",
            "mode": "translate",
            "requestId": "r",
            "clientId": "c",
        }));
        assert!(matches!(result, Err(RankForgeError::Validation(_))));
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(JobRequest::from_payload(json!("just a string")).is_err());
        assert!(JobRequest::from_payload(json!(42)).is_err());
        assert!(JobRequest::from_payload(json!(["a", "b"])).is_err());
    }
}
