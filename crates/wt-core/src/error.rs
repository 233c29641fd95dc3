use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreviewError>;

/// Every way a preview request can end without a preview.
///
/// Errors are propagated to the caller unchanged; nothing in the protocol
/// downgrades one variant into another.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// The request was rejected before any network call.
    #[error("Invalid preview request: {0}")]
    Validation(String),

    /// The submission endpoint answered with a non-2xx status.
    #[error("{message}")]
    Submission { status: u16, message: String },

    /// A 2xx submission body carried neither `preview_url` nor `requestId`.
    #[error("Invalid response from preview service: {0}")]
    InvalidResponse(String),

    /// The job reached a terminal failure status upstream.
    #[error("{0}")]
    GenerationFailed(String),

    #[error("Preview generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The status endpoint reported the job as unknown and the poller was
    /// configured to give up on that.
    #[error("Preview request {request_id} was not found")]
    JobNotFound { request_id: String },

    /// Network failure, unexpected status on the poll endpoint or an
    /// undecodable body.
    #[error("Transport error: {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Preview request was cancelled")]
    Cancelled,

    /// The caller's manual retry budget is used up.
    #[error("Preview retry limit of {limit} reached")]
    RetryLimitReached { limit: u32 },
}

impl PreviewError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { status: None, message: message.into() }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Submission { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the UI should offer a manual retry for this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submission { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::GenerationFailed(_)
            | Self::JobNotFound { .. } => true,
            Self::Validation(_)
            | Self::InvalidResponse(_)
            | Self::Cancelled
            | Self::RetryLimitReached { .. } => false,
        }
    }

    /// Short text suitable for showing next to the preview spinner.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Choose a photo and a style to generate a preview.",
            Self::Submission { status: 429, .. } => {
                "Too many requests. Please wait a moment and try again."
            }
            Self::Submission { status: 401 | 403, .. } => {
                "Your session has expired. Please sign in again."
            }
            Self::Submission { status, .. } if *status >= 500 => {
                "The preview service is temporarily unavailable."
            }
            Self::Submission { .. } => "We couldn't start your preview.",
            Self::InvalidResponse(_) => "The preview service sent an unexpected response.",
            Self::GenerationFailed(_) | Self::JobNotFound { .. } => {
                "We couldn't generate this preview."
            }
            Self::Timeout { .. } => "Your preview is taking longer than expected.",
            Self::Transport { status: Some(503), .. } => {
                "The preview service is temporarily unavailable."
            }
            Self::Transport { .. } => "Connection issue. Check your network and try again.",
            Self::Cancelled => "Preview cancelled.",
            Self::RetryLimitReached { .. } => "Previews are unavailable right now. You can continue without one.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_displays_body_verbatim() {
        let err = PreviewError::Submission { status: 500, message: "internal error".into() };
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn test_generation_failed_displays_upstream_message() {
        let err = PreviewError::GenerationFailed("model overloaded".into());
        assert_eq!(err.to_string(), "model overloaded");
    }

    #[test]
    fn test_user_messages() {
        let busy = PreviewError::Submission { status: 429, message: String::new() };
        assert!(busy.user_message().contains("Too many requests"));

        let down = PreviewError::Submission { status: 503, message: String::new() };
        assert!(down.user_message().contains("unavailable"));

        assert!(PreviewError::transport("reset").user_message().contains("Connection issue"));
    }

    #[test]
    fn test_retryable() {
        assert!(PreviewError::Timeout { attempts: 25 }.is_retryable());
        assert!(PreviewError::GenerationFailed("x".into()).is_retryable());
        assert!(!PreviewError::Cancelled.is_retryable());
        assert!(!PreviewError::Validation("x".into()).is_retryable());
        assert!(!PreviewError::Submission { status: 400, message: String::new() }.is_retryable());
        assert!(!PreviewError::RetryLimitReached { limit: 3 }.is_retryable());
    }

    #[test]
    fn test_retry_limit_offers_to_continue() {
        let err = PreviewError::RetryLimitReached { limit: 1 };
        assert!(err.user_message().contains("continue without"));
        assert_ne!(err.user_message(), PreviewError::Validation(String::new()).user_message());
    }
}
