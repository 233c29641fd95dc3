//! In-memory transport that replays scripted responses.
//!
//! Used by the protocol tests to observe exactly how many calls were made
//! without touching the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use wt_core::{GenerationRequest, PreviewError, Result};
use crate::transport::{PreviewTransport, RawResponse};

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    submissions: Mutex<VecDeque<Result<RawResponse>>>,
    statuses: Mutex<VecDeque<Result<RawResponse>>>,
    /// Replayed once `statuses` runs dry.
    repeat_status: Option<RawResponse>,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
    submitted_keys: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_submit(self, response: RawResponse) -> Self {
        self.on_submit_result(Ok(response))
    }

    pub fn on_submit_json(self, body: Value) -> Self {
        self.on_submit(RawResponse::json(200, body))
    }

    pub fn on_submit_result(mut self, response: Result<RawResponse>) -> Self {
        self.submissions.get_mut().push_back(response);
        self
    }

    pub fn then_status(self, response: RawResponse) -> Self {
        self.then_status_result(Ok(response))
    }

    pub fn then_status_json(self, body: Value) -> Self {
        self.then_status(RawResponse::json(200, body))
    }

    pub fn then_status_result(mut self, response: Result<RawResponse>) -> Self {
        self.statuses.get_mut().push_back(response);
        self
    }

    pub fn repeat_status_json(mut self, body: Value) -> Self {
        self.repeat_status = Some(RawResponse::json(200, body));
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub async fn submitted_keys(&self) -> Vec<String> {
        self.submitted_keys.lock().await.clone()
    }
}

#[async_trait]
impl PreviewTransport for ScriptedTransport {
    async fn post_generate(&self, request: &GenerationRequest) -> Result<RawResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_keys
            .lock()
            .await
            .push(request.idempotency_key().as_str().to_string());

        self.submissions
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(PreviewError::transport("no scripted submission response")))
    }

    async fn get_status(&self, _request_id: &str) -> Result<RawResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(next) = self.statuses.lock().await.pop_front() {
            return next;
        }

        self.repeat_status
            .clone()
            .ok_or_else(|| PreviewError::transport("no scripted status response"))
    }
}
