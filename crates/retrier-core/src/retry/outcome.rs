//! Result of one retry run.

use std::time::Duration;

/// What a run produced. Built exactly once, when the loop stops or the
/// overall duration elapses, whichever comes first.
#[derive(Debug)]
pub struct Outcome<T, E> {
    /// The overall duration elapsed before the loop stopped on its own.
    pub timed_out: bool,
    /// The stopping condition accepted a result.
    pub satisfied: bool,
    /// Attempts whose dispatch was committed (including skipped stragglers).
    pub attempts: u64,
    /// 0-based index of the attempt that produced [`Outcome::last`].
    pub last_attempt: Option<u64>,
    /// Latest recorded result; the satisfying one if the condition was met.
    pub last: Option<Result<T, E>>,
    /// Wall-clock time from start to outcome.
    pub elapsed: Duration,
}

impl<T, E> Outcome<T, E> {
    pub fn last_value(&self) -> Option<&T> {
        self.last.as_ref().and_then(|r| r.as_ref().ok())
    }

    pub fn last_error(&self) -> Option<&E> {
        self.last.as_ref().and_then(|r| r.as_ref().err())
    }

    pub fn into_last(self) -> Option<Result<T, E>> {
        self.last
    }
}
