use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use wt_core::{GenerationRequest, PreviewError, PreviewResult, Result};
use crate::cancel::CancelToken;
use crate::generator::PreviewGenerator;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// What the UI should offer after a failed preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { remaining: u32 },
    ContinueWithoutPreview,
}

struct InFlight {
    ticket: u64,
    style: String,
    cancel: CancelToken,
}

#[derive(Default)]
struct SessionState {
    next_ticket: u64,
    in_flight: Option<InFlight>,
    failures: u32,
}

/// One preview surface of the storefront.
///
/// Keeps at most one request in flight: starting a new preview cancels the
/// previous one. Retryable failures are counted so the UI can stop offering
/// retries after `max_retries`.
pub struct PreviewSession {
    generator: Arc<PreviewGenerator>,
    max_retries: u32,
    state: Mutex<SessionState>,
}

impl PreviewSession {
    pub fn new(generator: Arc<PreviewGenerator>) -> Self {
        Self::with_max_retries(generator, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(generator: Arc<PreviewGenerator>, max_retries: u32) -> Self {
        Self {
            generator,
            max_retries,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub async fn request(&self, request: &GenerationRequest) -> Result<PreviewResult> {
        let cancel = CancelToken::new();
        let ticket = {
            let mut state = self.state.lock().await;
            state.next_ticket += 1;
            let ticket = state.next_ticket;
            let stale = state.in_flight.replace(InFlight {
                ticket,
                style: request.style_identifier().to_string(),
                cancel: cancel.clone(),
            });
            if let Some(stale) = stale {
                info!(
                    stale_style = %stale.style,
                    style = request.style_identifier(),
                    "cancelling stale preview request"
                );
                stale.cancel.cancel();
            }
            ticket
        };

        let result = self.generator.generate(request, &cancel).await;

        let mut state = self.state.lock().await;
        if state.in_flight.as_ref().is_some_and(|f| f.ticket == ticket) {
            state.in_flight = None;
        }
        match &result {
            Ok(_) => state.failures = 0,
            Err(e) if e.is_retryable() => {
                state.failures += 1;
                debug!(failures = state.failures, "preview failure recorded");
            }
            Err(_) => {}
        }

        result
    }

    /// Cancel whatever is in flight, e.g. when the user leaves the page.
    pub async fn cancel(&self) {
        if let Some(in_flight) = self.state.lock().await.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }

    pub async fn in_flight_style(&self) -> Option<String> {
        self.state.lock().await.in_flight.as_ref().map(|f| f.style.clone())
    }

    pub async fn retry_decision(&self) -> RetryDecision {
        let failures = self.state.lock().await.failures;
        if failures >= self.max_retries {
            RetryDecision::ContinueWithoutPreview
        } else {
            RetryDecision::Retry { remaining: self.max_retries - failures }
        }
    }

    /// Retry the same request if the failure budget allows it.
    pub async fn retry(&self, request: &GenerationRequest) -> Result<PreviewResult> {
        match self.retry_decision().await {
            RetryDecision::Retry { .. } => self.request(request).await,
            RetryDecision::ContinueWithoutPreview => {
                Err(PreviewError::RetryLimitReached { limit: self.max_retries })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wt_core::{IdempotencyKey, PollSchedule};
    use crate::mock::ScriptedTransport;
    use crate::poller::StatusPoller;
    use crate::transport::RawResponse;

    fn request(style: &str) -> GenerationRequest {
        GenerationRequest::builder("https://x/photo.jpg", style)
            .idempotency_key(IdempotencyKey::new(format!("{}-key", style)))
            .build()
            .unwrap()
    }

    fn session(transport: ScriptedTransport, max_retries: u32) -> PreviewSession {
        let generator = PreviewGenerator::new(Arc::new(transport), StatusPoller::new(PollSchedule::default()));
        PreviewSession::with_max_retries(Arc::new(generator), max_retries)
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_style_cancels_stale_request() {
        let transport = ScriptedTransport::new()
            .on_submit_json(json!({ "requestId": "slow" }))
            .on_submit_json(json!({ "preview_url": "https://x/neon.jpg" }))
            .repeat_status_json(json!({ "status": "processing" }));
        let session = session(transport, 3);

        let first = request("watercolor-dreams");
        let second = request("neon-splash");
        let (stale, fresh) = tokio::join!(session.request(&first), session.request(&second));

        assert_eq!(stale.unwrap_err(), PreviewError::Cancelled);
        assert_eq!(fresh.unwrap().preview_url, "https://x/neon.jpg");
        assert_eq!(session.in_flight_style().await, None);
    }

    #[tokio::test]
    async fn test_retry_budget() {
        let transport = ScriptedTransport::new()
            .on_submit(RawResponse::new(503, "down"))
            .on_submit(RawResponse::new(503, "down"));
        let session = session(transport, 2);
        let request = request("pastel-bliss");

        assert!(session.request(&request).await.is_err());
        assert_eq!(session.retry_decision().await, RetryDecision::Retry { remaining: 1 });

        assert!(session.retry(&request).await.is_err());
        assert_eq!(session.retry_decision().await, RetryDecision::ContinueWithoutPreview);

        let err = session.retry(&request).await.unwrap_err();
        assert_eq!(err, PreviewError::RetryLimitReached { limit: 2 });
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let transport = ScriptedTransport::new()
            .on_submit(RawResponse::new(500, "boom"))
            .on_submit_json(json!({ "preview_url": "https://x/ok.jpg" }));
        let session = session(transport, 3);
        let request = request("gemstone-poly");

        session.request(&request).await.unwrap_err();
        session.request(&request).await.unwrap();
        assert_eq!(session.retry_decision().await, RetryDecision::Retry { remaining: 3 });
    }
}
