pub mod error;
pub mod phase;
pub mod request;
pub mod response;
pub mod schedule;
pub mod status;
mod style_types;

pub use error::{PreviewError, Result};
pub use phase::{InvalidTransition, PreviewPhase};
pub use request::{AspectRatio, GenerationRequest, GenerationRequestBuilder, IdempotencyKey, Quality};
pub use response::{JobHandle, PreviewResult, SubmitOutcome, SubmitPayload};
pub use schedule::PollSchedule;
pub use status::{PollStep, StatusKind, StatusSnapshot};
pub use style_types::ArtStyle;
