use std::sync::Arc;
use futures::future::join_all;
use tracing::{info, warn};
use wt_core::{GenerationRequest, PreviewError, PreviewPhase, PreviewResult, Result, SubmitOutcome};
use crate::cancel::CancelToken;
use crate::config::PreviewConfig;
use crate::events::{EventSink, PreviewEvent};
use crate::poller::StatusPoller;
use crate::submit::submit;
use crate::transport::{HttpTransport, PreviewTransport};

/// Runs the whole request -> submit -> poll flow for one preview and folds
/// every success path into a [`PreviewResult`].
pub struct PreviewGenerator {
    transport: Arc<dyn PreviewTransport>,
    poller: StatusPoller,
    events: EventSink,
}

impl PreviewGenerator {
    pub fn new(transport: Arc<dyn PreviewTransport>, poller: StatusPoller) -> Self {
        Self {
            transport,
            poller,
            events: EventSink::default(),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        let poller = StatusPoller::new(config.schedule).abort_on_not_found(config.abort_on_not_found);
        Ok(Self::new(Arc::new(transport), poller))
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub async fn generate(&self, request: &GenerationRequest, cancel: &CancelToken) -> Result<PreviewResult> {
        let mut tracker = PhaseTracker::new(request.style_identifier(), &self.events);

        let result = self.run(request, cancel, &mut tracker).await;
        if let Err(e) = &result {
            tracker.enter(match e {
                PreviewError::Cancelled => PreviewPhase::Cancelled,
                PreviewError::Timeout { .. } => PreviewPhase::TimedOut,
                _ => PreviewPhase::Failed,
            });
            info!(style = request.style_identifier(), "preview ended without a result: {}", e);
        }
        result
    }

    /// Independent previews, e.g. several styles for the same photo. No
    /// coordination between them beyond the shared cancel token.
    pub async fn generate_all(&self, requests: &[GenerationRequest], cancel: &CancelToken) -> Vec<Result<PreviewResult>> {
        join_all(requests.iter().map(|request| self.generate(request, cancel))).await
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
        tracker: &mut PhaseTracker<'_>,
    ) -> Result<PreviewResult> {
        info!(
            style = request.style_identifier(),
            aspect_ratio = %request.aspect_ratio(),
            idempotency_key = %request.idempotency_key(),
            "submitting preview request"
        );

        let outcome = cancel.guard(submit(self.transport.as_ref(), request)).await?;
        tracker.enter(PreviewPhase::Submitted);

        match outcome {
            SubmitOutcome::Complete { preview_url, is_authenticated } => {
                tracker.enter(PreviewPhase::Complete);
                info!(style = request.style_identifier(), "preview resolved synchronously");
                Ok(PreviewResult {
                    preview_url,
                    request_id: None,
                    attempts: 0,
                    is_authenticated,
                })
            }
            SubmitOutcome::Pending(handle) => {
                tracker.request_id = Some(handle.request_id.clone());
                tracker.enter(PreviewPhase::Pending);
                tracker.enter(PreviewPhase::Polling);

                let polled = self.poller.poll(self.transport.as_ref(), &handle, cancel, &self.events).await?;
                tracker.enter(PreviewPhase::Complete);

                Ok(PreviewResult {
                    preview_url: polled.preview_url,
                    request_id: Some(handle.request_id),
                    attempts: polled.attempts,
                    is_authenticated: None,
                })
            }
        }
    }
}

struct PhaseTracker<'a> {
    style: &'a str,
    phase: PreviewPhase,
    request_id: Option<String>,
    events: &'a EventSink,
}

impl<'a> PhaseTracker<'a> {
    fn new(style: &'a str, events: &'a EventSink) -> Self {
        let tracker = Self {
            style,
            phase: PreviewPhase::Building,
            request_id: None,
            events,
        };
        tracker.emit();
        tracker
    }

    fn enter(&mut self, next: PreviewPhase) {
        match self.phase.advance(next) {
            Ok(phase) => {
                self.phase = phase;
                self.emit();
            }
            Err(e) => warn!("{}", e),
        }
    }

    fn emit(&self) {
        self.events.emit(PreviewEvent::Phase {
            style: self.style.to_string(),
            phase: self.phase,
            request_id: self.request_id.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wt_core::{IdempotencyKey, PollSchedule};
    use crate::mock::ScriptedTransport;

    fn request() -> GenerationRequest {
        GenerationRequest::builder("https://x/photo.jpg", "pop-art-burst")
            .idempotency_key(IdempotencyKey::new("pop-art-burst-1-0"))
            .build()
            .unwrap()
    }

    fn generator(transport: Arc<ScriptedTransport>) -> (PreviewGenerator, tokio::sync::mpsc::UnboundedReceiver<PreviewEvent>) {
        let (events, rx) = EventSink::channel();
        let generator = PreviewGenerator::new(transport, StatusPoller::new(PollSchedule::default())).with_events(events);
        (generator, rx)
    }

    fn phases(rx: &mut tokio::sync::mpsc::UnboundedReceiver<PreviewEvent>) -> Vec<PreviewPhase> {
        let mut phases = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let PreviewEvent::Phase { phase, .. } = event {
                phases.push(phase);
            }
        }
        phases
    }

    #[tokio::test]
    async fn test_synchronous_phases() {
        let transport = Arc::new(ScriptedTransport::new().on_submit_json(json!({ "preview_url": "https://x/y.jpg" })));
        let (generator, mut rx) = generator(transport);

        generator.generate(&request(), &CancelToken::new()).await.unwrap();

        use PreviewPhase::*;
        assert_eq!(phases(&mut rx), vec![Building, Submitted, Complete]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polled_phases() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .on_submit_json(json!({ "requestId": "abc123" }))
                .then_status_json(json!({ "status": "processing" }))
                .then_status_json(json!({ "status": "failed", "error": "nsfw" })),
        );
        let (generator, mut rx) = generator(transport);

        let err = generator.generate(&request(), &CancelToken::new()).await.unwrap_err();
        assert_eq!(err, PreviewError::GenerationFailed("nsfw".into()));

        use PreviewPhase::*;
        assert_eq!(phases(&mut rx), vec![Building, Submitted, Pending, Polling, Failed]);
    }

    #[tokio::test]
    async fn test_submission_failure_phase() {
        let transport = Arc::new(ScriptedTransport::new().on_submit(crate::transport::RawResponse::new(500, "boom")));
        let (generator, mut rx) = generator(transport);

        generator.generate(&request(), &CancelToken::new()).await.unwrap_err();

        use PreviewPhase::*;
        assert_eq!(phases(&mut rx), vec![Building, Failed]);
    }

    #[tokio::test]
    async fn test_cancelled_before_submission() {
        let transport = Arc::new(ScriptedTransport::new().on_submit_json(json!({ "preview_url": "https://x/y.jpg" })));
        let (generator, mut rx) = generator(transport.clone());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = generator.generate(&request(), &cancel).await.unwrap_err();
        assert_eq!(err, PreviewError::Cancelled);
        assert_eq!(transport.submit_calls(), 0);

        use PreviewPhase::*;
        assert_eq!(phases(&mut rx), vec![Building, Cancelled]);
    }
}
