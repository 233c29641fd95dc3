use serde::{Deserialize, Serialize};
use crate::error::{PreviewError, Result};

/// Raw submission body as the backend sends it. The presence of
/// `preview_url` or `requestId` decides the branch; see [`SubmitOutcome`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "isAuthenticated", default, skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<bool>,
}

/// Opaque id of a job the backend did not resolve synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub request_id: String,
}

/// Classified submission response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Complete {
        preview_url: String,
        is_authenticated: Option<bool>,
    },
    Pending(JobHandle),
}

impl SubmitOutcome {
    /// Classify an already-parsed JSON body. A body that is not an object,
    /// or an object with neither field, is a protocol violation.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let shown = value.to_string();
        let payload: SubmitPayload = serde_json::from_value(value)
            .map_err(|e| PreviewError::InvalidResponse(format!("{}: {}", e, shown)))?;
        Self::try_from(payload)
    }
}

impl TryFrom<SubmitPayload> for SubmitOutcome {
    type Error = PreviewError;

    fn try_from(payload: SubmitPayload) -> Result<Self> {
        if let Some(preview_url) = payload.preview_url.filter(|url| !url.trim().is_empty()) {
            return Ok(Self::Complete {
                preview_url,
                is_authenticated: payload.is_authenticated,
            });
        }

        if let Some(request_id) = payload.request_id.filter(|id| !id.trim().is_empty()) {
            return Ok(Self::Pending(JobHandle { request_id }));
        }

        Err(PreviewError::InvalidResponse(
            "response contained neither preview_url nor requestId".into(),
        ))
    }
}

/// The one shape a successful preview takes, however it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Status polls issued; zero when the submission resolved synchronously.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_authenticated: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preview_url_wins() {
        let outcome = SubmitOutcome::from_json(json!({
            "preview_url": "https://x/y.jpg",
            "requestId": "abc123",
            "isAuthenticated": true,
        }))
        .unwrap();

        assert_eq!(outcome, SubmitOutcome::Complete {
            preview_url: "https://x/y.jpg".into(),
            is_authenticated: Some(true),
        });
    }

    #[test]
    fn test_request_id_is_pending() {
        let outcome = SubmitOutcome::from_json(json!({ "requestId": "abc123" })).unwrap();
        assert_eq!(outcome, SubmitOutcome::Pending(JobHandle { request_id: "abc123".into() }));
    }

    #[test]
    fn test_empty_preview_url_falls_through() {
        let outcome = SubmitOutcome::from_json(json!({ "preview_url": "", "requestId": "r" })).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Pending(_)));
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let err = SubmitOutcome::from_json(json!({ "ok": true })).unwrap_err();
        assert!(matches!(err, PreviewError::InvalidResponse(_)));

        let err = SubmitOutcome::from_json(json!(["preview_url"])).unwrap_err();
        assert!(matches!(err, PreviewError::InvalidResponse(_)));
    }
}
