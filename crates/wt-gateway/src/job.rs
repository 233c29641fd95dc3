use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wt_core::{ArtStyle, AspectRatio, StatusSnapshot};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobInputs {
    pub style: ArtStyle,
    pub prompt: String,
    pub image_url: String,
    pub aspect_ratio: AspectRatio,
    pub watermark: bool,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewJob {
    pub request_id: String,
    pub inputs: JobInputs,
    pub status: JobStatus,
    /// Status reads so far; the simulated backend advances one step per read.
    pub polls: u32,
    pub preview_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PreviewJob {
    pub fn new(request_id: String, inputs: JobInputs) -> Self {
        let now = Utc::now();
        Self {
            request_id,
            inputs,
            status: JobStatus::Queued,
            polls: 0,
            preview_url: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            request_id: Some(self.request_id.clone()),
            status: self.status.as_str().to_string(),
            preview_url: self.preview_url.clone(),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::{PollStep, StatusKind};

    fn job() -> PreviewJob {
        PreviewJob::new("req-1".into(), JobInputs {
            style: ArtStyle::NeonSplash,
            prompt: ArtStyle::NeonSplash.prompt().into(),
            image_url: "https://x/p.jpg".into(),
            aspect_ratio: AspectRatio::Square,
            watermark: true,
            is_authenticated: false,
        })
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = job();
        assert!(job.status.is_active());
        assert_eq!(job.snapshot().kind(), StatusKind::InProgress);
    }

    #[test]
    fn test_snapshot_speaks_client_protocol() {
        let mut job = job();
        job.status = JobStatus::Succeeded;
        job.preview_url = Some("http://127.0.0.1/previews/req-1.png".into());
        assert_eq!(job.snapshot().step(), PollStep::Succeeded("http://127.0.0.1/previews/req-1.png".into()));

        job.status = JobStatus::Failed;
        job.preview_url = None;
        job.error = Some("model overloaded".into());
        assert_eq!(job.snapshot().step(), PollStep::Failed("model overloaded".into()));
    }
}
