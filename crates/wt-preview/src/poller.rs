use tracing::{debug, info};
use wt_core::{JobHandle, PollSchedule, PollStep, PreviewError, Result, StatusSnapshot};
use crate::cancel::CancelToken;
use crate::events::{EventSink, PreviewEvent};
use crate::transport::{PreviewTransport, RawResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledPreview {
    pub preview_url: String,
    pub attempts: u32,
}

/// Resolves a [`JobHandle`] by polling the status endpoint.
///
/// Polls are strictly sequential. The first poll goes out immediately and
/// after a non-terminal poll `n` the poller sleeps
/// [`PollSchedule::delay_after`]`(n)`. There is no sleep after the last poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPoller {
    schedule: PollSchedule,
    abort_on_not_found: bool,
}

impl StatusPoller {
    /// A pending job always gets at least one status check.
    pub fn new(mut schedule: PollSchedule) -> Self {
        schedule.max_attempts = schedule.max_attempts.max(1);
        Self { schedule, abort_on_not_found: false }
    }

    pub fn abort_on_not_found(mut self, abort: bool) -> Self {
        self.abort_on_not_found = abort;
        self
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    pub async fn poll(
        &self,
        transport: &dyn PreviewTransport,
        handle: &JobHandle,
        cancel: &CancelToken,
        events: &EventSink,
    ) -> Result<PolledPreview> {
        let request_id = handle.request_id.as_str();
        let max_attempts = self.schedule.max_attempts;

        for attempt in 1..=max_attempts {
            let raw = cancel.guard(transport.get_status(request_id)).await?;
            let snapshot = classify_status(raw, request_id)?;

            debug!(request_id, attempt, status = %snapshot.status, "status checked");
            events.emit(PreviewEvent::StatusChecked {
                request_id: request_id.to_string(),
                attempt,
                status: snapshot.status.clone(),
            });

            if self.abort_on_not_found && snapshot.is_not_found() {
                return Err(PreviewError::JobNotFound { request_id: request_id.to_string() });
            }

            match snapshot.step() {
                PollStep::Succeeded(preview_url) => {
                    info!(request_id, attempt, "preview ready");
                    return Ok(PolledPreview { preview_url, attempts: attempt });
                }
                PollStep::Failed(message) => {
                    info!(request_id, attempt, "preview generation failed: {}", message);
                    return Err(PreviewError::GenerationFailed(message));
                }
                PollStep::Continue => {}
            }

            if attempt < max_attempts {
                let delay = self.schedule.delay_after(attempt);
                cancel
                    .guard(async {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    })
                    .await?;
            }
        }

        info!(request_id, max_attempts, "gave up waiting for preview");
        Err(PreviewError::Timeout { attempts: max_attempts })
    }
}

/// 200 is a snapshot, 404 is a `not_found` snapshot, anything else is a
/// transport failure rather than a generation failure.
pub fn classify_status(raw: RawResponse, request_id: &str) -> Result<StatusSnapshot> {
    match raw.status {
        404 => Ok(StatusSnapshot::not_found(request_id)),
        200..=299 => serde_json::from_str(&raw.body).map_err(|e| PreviewError::Transport {
            status: Some(raw.status),
            message: format!("status response was not valid JSON: {}", e),
        }),
        status => Err(PreviewError::Transport {
            status: Some(status),
            message: format!("status check failed with HTTP {}: {}", status, raw.body.trim()),
        }),
    }
}
