use serde_json::Value;
use tracing::debug;
use wt_core::{GenerationRequest, PreviewError, Result, SubmitOutcome};
use crate::transport::{PreviewTransport, RawResponse};

/// POST the request once and classify the answer.
pub async fn submit(transport: &dyn PreviewTransport, request: &GenerationRequest) -> Result<SubmitOutcome> {
    let raw = transport.post_generate(request).await?;
    debug!(status = raw.status, "submission answered");
    classify_submission(raw)
}

pub fn classify_submission(raw: RawResponse) -> Result<SubmitOutcome> {
    if !raw.is_success() {
        return Err(PreviewError::Submission {
            status: raw.status,
            message: error_message(raw.status, &raw.body),
        });
    }

    let value: Value = serde_json::from_str(&raw.body).map_err(|e| PreviewError::Transport {
        status: Some(raw.status),
        message: format!("submission response was not JSON: {}", e),
    })?;

    SubmitOutcome::from_json(value)
}

/// Error bodies are plain text or `{"error": ...}` / `{"message": ...}`.
fn error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("Preview request failed with HTTP {}", status);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let field = ["error", "message"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|text| !text.is_empty());
        if let Some(text) = field {
            return text.to_string();
        }
    }

    body.to_string()
}
