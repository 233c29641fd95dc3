use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a single preview request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreviewPhase {
    Building,
    Submitted,
    Pending,
    Polling,
    Complete,
    Failed,
    TimedOut,
    Cancelled,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal preview phase transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: PreviewPhase,
    pub to: PreviewPhase,
}

impl PreviewPhase {
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::TimedOut | Self::Cancelled)
    }

    pub fn can_advance_to(&self, next: PreviewPhase) -> bool {
        use PreviewPhase::*;

        match (self, next) {
            (Building, Submitted | Failed | Cancelled) => true,
            (Submitted, Complete | Pending | Failed | Cancelled) => true,
            (Pending, Polling | Cancelled) => true,
            (Polling, Polling | Complete | Failed | TimedOut | Cancelled) => true,
            _ => false,
        }
    }

    pub fn advance(self, next: PreviewPhase) -> Result<PreviewPhase, InvalidTransition> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Polling => "polling",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PreviewPhase::*;

    #[test]
    fn test_synchronous_path() {
        let phase = Building.advance(Submitted).and_then(|p| p.advance(Complete)).unwrap();
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_polling_path() {
        let mut phase = Building;
        for next in [Submitted, Pending, Polling, Polling, TimedOut] {
            phase = phase.advance(next).unwrap();
        }
        assert_eq!(phase, TimedOut);
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for terminal in [Complete, Failed, TimedOut, Cancelled] {
            assert!(terminal.advance(Polling).is_err());
        }
    }

    #[test]
    fn test_every_active_phase_can_be_cancelled() {
        for active in [Building, Submitted, Pending, Polling] {
            assert!(active.is_active());
            assert_eq!(active.advance(Cancelled), Ok(Cancelled), "{:?}", active);
        }
    }

    #[test]
    fn test_pending_cannot_complete_without_polling() {
        assert_eq!(
            Pending.advance(Complete),
            Err(InvalidTransition { from: Pending, to: Complete })
        );
    }
}
