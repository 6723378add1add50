use std::time::Duration;

/// Maximum automatic retries for one logical send.
pub const MAX_RETRIES: u32 = 3;
/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 1000;

/// Outcome of asking the coordinator about one more attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry as attempt `attempt` (1-based) after sleeping `delay`.
    Retry { attempt: u32, delay: Duration },
    /// The retry budget is spent; surface a terminal failure.
    GiveUp,
}

/// Bounded retry policy for one logical send operation.
///
/// The counter spans every automatic re-send of the same user text and
/// resets when a fresh send starts, a send completes successfully, or
/// the user starts a new chat.
#[derive(Debug, Clone, Default)]
pub struct RetryCoordinator {
    attempts: u32,
}

impl RetryCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Record one failure and decide whether to retry.
    pub fn next_attempt(&mut self) -> RetryDecision {
        if self.attempts >= MAX_RETRIES {
            return RetryDecision::GiveUp;
        }

        self.attempts += 1;
        RetryDecision::Retry {
            attempt: self.attempts,
            delay: retry_delay(self.attempts),
        }
    }
}

/// Exponential backoff delay for a 1-based retry attempt.
#[must_use]
pub fn retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(30);
    Duration::from_millis(BASE_DELAY_MS * 2u64.saturating_pow(exponent))
}

/// User-visible notice for a scheduled retry.
#[must_use]
pub fn retry_notice(attempt: u32) -> String {
    format!("Retrying... Attempt {attempt}/{MAX_RETRIES}")
}
