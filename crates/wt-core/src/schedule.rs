use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Capped linear backoff for the status poller.
///
/// After poll `n` (1-indexed) comes back non-terminal the poller waits
/// `min(max_delay_ms, initial_delay_ms + n * backoff_increment_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSchedule {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_increment_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            max_attempts: 25,
            initial_delay_ms: 400,
            backoff_increment_ms: 200,
            max_delay_ms: 3200,
        }
    }
}

impl PollSchedule {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let ms = self
            .initial_delay_ms
            .saturating_add(u64::from(attempt).saturating_mul(self.backoff_increment_ms))
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Waits between consecutive polls when every poll is non-terminal.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(|attempt| self.delay_after(attempt))
    }

    /// Worst-case time spent sleeping before a timeout is declared.
    pub fn total_wait(&self) -> Duration {
        self.delays().sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max attempts must be at least 1".into());
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "max delay ({}ms) is below the initial delay ({}ms)",
                self.max_delay_ms, self.initial_delay_ms
            ));
        }
        Ok(())
    }
}
