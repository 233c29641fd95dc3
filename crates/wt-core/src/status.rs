use serde::{Deserialize, Serialize};

pub const NOT_FOUND_STATUS: &str = "not_found";
pub const GENERIC_FAILURE: &str = "Preview generation failed";

/// Body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Closed set the open-ended status string is folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    InProgress,
    Succeeded,
    Failed,
    Unknown,
}

impl StatusKind {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "complete" => Self::Succeeded,
            "failed" | "error" => Self::Failed,
            "queued" | "pending" | "starting" | "processing" | "in_progress" | "running"
            | "generating" => Self::InProgress,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// What the poller should do after observing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    Succeeded(String),
    Failed(String),
}

impl StatusSnapshot {
    pub fn new(request_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            status: status.into(),
            ..Default::default()
        }
    }

    /// Stand-in for a 404 from the status endpoint.
    pub fn not_found(request_id: impl Into<String>) -> Self {
        Self::new(request_id, NOT_FOUND_STATUS)
    }

    pub fn succeeded(request_id: impl Into<String>, preview_url: impl Into<String>) -> Self {
        Self {
            preview_url: Some(preview_url.into()),
            ..Self::new(request_id, "succeeded")
        }
    }

    pub fn failed(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(request_id, "failed")
        }
    }

    pub fn kind(&self) -> StatusKind {
        StatusKind::parse(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status.eq_ignore_ascii_case(NOT_FOUND_STATUS)
    }

    /// A success label without a usable URL is still in progress; the
    /// backend has been seen to flip the status before attaching the asset.
    pub fn step(&self) -> PollStep {
        match self.kind() {
            StatusKind::Succeeded => match self.preview_url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => PollStep::Succeeded(url.to_string()),
                _ => PollStep::Continue,
            },
            StatusKind::Failed => PollStep::Failed(
                self.error
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .unwrap_or(GENERIC_FAILURE)
                    .to_string(),
            ),
            StatusKind::InProgress | StatusKind::Unknown => PollStep::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(StatusKind::parse("SUCCEEDED"), StatusKind::Succeeded);
        assert_eq!(StatusKind::parse("Complete"), StatusKind::Succeeded);
        assert_eq!(StatusKind::parse(" Error "), StatusKind::Failed);
        assert_eq!(StatusKind::parse("failed"), StatusKind::Failed);
        assert_eq!(StatusKind::parse("Processing"), StatusKind::InProgress);
        assert_eq!(StatusKind::parse("not_found"), StatusKind::Unknown);
        assert_eq!(StatusKind::parse(""), StatusKind::Unknown);
    }

    #[test]
    fn test_success_requires_url() {
        let mut snapshot = StatusSnapshot::new("abc", "complete");
        assert_eq!(snapshot.step(), PollStep::Continue);

        snapshot.preview_url = Some("   ".into());
        assert_eq!(snapshot.step(), PollStep::Continue);

        snapshot.preview_url = Some("https://x/z.jpg".into());
        assert_eq!(snapshot.step(), PollStep::Succeeded("https://x/z.jpg".into()));
    }

    #[test]
    fn test_failure_message() {
        let snapshot = StatusSnapshot::failed("abc", "model overloaded");
        assert_eq!(snapshot.step(), PollStep::Failed("model overloaded".into()));

        let bare = StatusSnapshot::new("abc", "ERROR");
        assert_eq!(bare.step(), PollStep::Failed(GENERIC_FAILURE.into()));
    }

    #[test]
    fn test_unknown_keeps_polling() {
        assert_eq!(StatusSnapshot::not_found("abc").step(), PollStep::Continue);
        assert_eq!(StatusSnapshot::new("abc", "warming_up").step(), PollStep::Continue);
    }

    #[test]
    fn test_deserialize_wire_body() {
        let snapshot: StatusSnapshot = serde_json::from_str(
            r#"{"request_id":"abc123","status":"succeeded","preview_url":"https://x/z.jpg"}"#,
        )
        .unwrap();
        assert_eq!(snapshot, StatusSnapshot::succeeded("abc123", "https://x/z.jpg"));
    }
}
