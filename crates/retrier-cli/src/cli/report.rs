//! Final report printed after a run.

use retrier_core::{Outcome, RetrySettings};
use serde::Serialize;

use super::program::ProgramFailure;

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub command: &'a [String],
    pub settings: &'a RetrySettings,
    pub succeeded: bool,
    pub timed_out: bool,
    pub attempts: u64,
    pub last_attempt: Option<u64>,
    pub last_error: Option<String>,
    pub elapsed_ms: u64,
}

impl<'a> Report<'a> {
    pub fn new(
        command: &'a [String],
        settings: &'a RetrySettings,
        outcome: &Outcome<(), ProgramFailure>,
    ) -> Self {
        Self {
            command,
            settings,
            succeeded: outcome.satisfied,
            timed_out: outcome.timed_out,
            attempts: outcome.attempts,
            last_attempt: outcome.last_attempt,
            last_error: outcome.last_error().map(|e| e.to_string()),
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let secs = self.elapsed_ms as f64 / 1000.0;
        if self.succeeded {
            return format!(
                "succeeded on attempt {} of {} after {:.1}s",
                self.last_attempt.map(|a| a + 1).unwrap_or(self.attempts),
                self.attempts,
                secs
            );
        }
        let reason = if self.timed_out {
            "time budget exhausted"
        } else {
            "attempts exhausted"
        };
        match &self.last_error {
            Some(err) => format!(
                "gave up after {} attempt(s) in {:.1}s ({}); last error: {}",
                self.attempts, secs, reason, err
            ),
            None => format!(
                "gave up after {} attempt(s) in {:.1}s ({})",
                self.attempts, secs, reason
            ),
        }
    }
}
