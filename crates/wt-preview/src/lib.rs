//! Client side of the style preview protocol: submit a generation request,
//! poll for the result on a capped linear schedule, and hand back either a
//! preview URL or one typed error.

pub mod cancel;
pub mod config;
pub mod events;
pub mod generator;
pub mod mock;
pub mod poller;
pub mod session;
pub mod submit;
pub mod transport;

pub use cancel::CancelToken;
pub use config::{ConfigError, PreviewConfig};
pub use events::{EventSink, PreviewEvent};
pub use generator::PreviewGenerator;
pub use poller::{PolledPreview, StatusPoller};
pub use session::{PreviewSession, RetryDecision};
pub use transport::{HttpTransport, PreviewTransport, RawResponse};
