use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use wt_core::{PreviewError, Result};

/// Shared cancellation flag for one preview request.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state: Arc::new(state) }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Fails fast if already cancelled, otherwise races `fut` against
    /// cancellation. A cancelled future is dropped, aborting its I/O.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(PreviewError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(PreviewError::Cancelled),
            result = fut => result,
        }
    }
}
