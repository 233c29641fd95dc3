use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use wt_core::PreviewPhase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEvent {
    Phase {
        style: String,
        phase: PreviewPhase,
        request_id: Option<String>,
    },
    StatusChecked {
        request_id: String,
        attempt: u32,
        status: String,
    },
}

/// Optional listener for progress updates. Sending never blocks and a
/// dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<PreviewEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, UnboundedReceiver<PreviewEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event: PreviewEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
