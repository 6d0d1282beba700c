//! Tick loop, per-attempt tasks and the deadline watchdog.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::error::RetryError;

use super::action::Action;
use super::backoff::Backoff;
use super::builder::{Dispatch, Retry};
use super::condition::Condition;
use super::outcome::Outcome;
use super::signal::StopSignal;
use super::slot::LastResult;

impl<A: Action> Retry<A> {
    /// Run the retry loop to completion on the current tokio runtime.
    ///
    /// Resolves once the loop stops (condition satisfied or max attempts
    /// reached) or the overall duration elapses, whichever comes first.
    /// Attempts still in flight at that point keep running detached.
    ///
    /// # Panics
    ///
    /// Resumes the panic of an attempt whose action or condition panicked
    /// before the run returned, whether the loop stopped or the deadline
    /// fired. Panics of detached in-flight attempts are not observed.
    pub async fn go(self) -> Outcome<A::Value, A::Error> {
        let start = Instant::now();
        let deadline = self.duration.and_then(|d| start.checked_add(d));
        let stop = StopSignal::new();
        let last = LastResult::new();

        let mut ticker = Ticker {
            action: self.action,
            condition: self.condition,
            backoff: self.backoff,
            interval: self.interval,
            max_attempts: self.max_attempts,
            dispatch: self.dispatch,
            stop: stop.clone(),
            last: last.clone(),
            attempts: 0,
            in_flight: Vec::new(),
        };

        // Deadline first: if both are ready at the same instant, the budget is spent.
        let timed_out = tokio::select! {
            biased;
            _ = watchdog(deadline) => true,
            _ = ticker.run() => false,
        };
        stop.set();
        ticker.reap().await;

        let (latest, satisfied) = last.take();
        let (last_attempt, last) = match latest {
            Some((attempt, result)) => (Some(attempt), Some(result)),
            None => (None, None),
        };
        let outcome = Outcome {
            timed_out,
            satisfied,
            attempts: ticker.attempts,
            last_attempt,
            last,
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            attempts = outcome.attempts,
            timed_out,
            satisfied,
            in_flight = ticker.in_flight.len(),
            "retry loop finished"
        );
        outcome
    }

    /// Blocking variant of [`Retry::go`] on a dedicated multi-threaded
    /// runtime. Must not be called from within a tokio runtime.
    ///
    /// The runtime is shut down in the background on return, so stragglers
    /// do not delay the caller.
    pub fn go_blocking(self) -> Result<Outcome<A::Value, A::Error>, RetryError> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let outcome = rt.block_on(self.go());
        rt.shutdown_background();
        Ok(outcome)
    }
}

async fn watchdog(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

struct Ticker<A: Action> {
    action: Arc<A>,
    condition: Condition<A::Value, A::Error>,
    backoff: Arc<dyn Backoff>,
    interval: Duration,
    max_attempts: u64,
    dispatch: Dispatch,
    stop: StopSignal,
    last: LastResult<A::Value, A::Error>,
    /// Attempts dispatched so far; also the index of the next one.
    attempts: u64,
    in_flight: Vec<JoinHandle<()>>,
}

impl<A: Action> Ticker<A> {
    async fn run(&mut self) {
        loop {
            self.reap().await;
            if self.attempts >= self.max_attempts {
                tracing::debug!(attempts = self.attempts, "max attempts reached");
                break;
            }
            if self.stop.is_set() {
                tracing::debug!(attempts = self.attempts, "stop requested");
                break;
            }

            let attempt = self.attempts;
            let handle = tokio::spawn(run_attempt(
                Arc::clone(&self.action),
                Arc::clone(&self.condition),
                self.stop.clone(),
                self.last.clone(),
                attempt,
            ));
            self.in_flight.push(handle);
            self.attempts += 1;
            tracing::trace!(attempt, "attempt dispatched");

            if self.dispatch == Dispatch::Serial {
                self.await_latest().await;
            }

            let delay = self.backoff.delay(attempt, self.interval);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
        }
        self.reap().await;
    }

    /// Join attempts that already finished, resuming any panic.
    async fn reap(&mut self) {
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|h| h.is_finished());
        self.in_flight = pending;
        for handle in done {
            resume(handle.await);
        }
    }

    /// Wait for the most recent attempt. The handle stays tracked while
    /// waiting, so a deadline that interrupts the wait leaves it to `reap`.
    async fn await_latest(&mut self) {
        if let Some(handle) = self.in_flight.last_mut() {
            let joined = handle.await;
            self.in_flight.pop();
            resume(joined);
        }
    }
}

fn resume(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        if let Ok(payload) = err.try_into_panic() {
            std::panic::resume_unwind(payload);
        }
    }
}

/// One dispatched attempt: skip if a stop was already requested, otherwise
/// invoke the action, record its result and evaluate the condition.
async fn run_attempt<A: Action>(
    action: Arc<A>,
    condition: Condition<A::Value, A::Error>,
    stop: StopSignal,
    last: LastResult<A::Value, A::Error>,
    attempt: u64,
) {
    if stop.is_set() {
        tracing::trace!(attempt, "stop already requested, attempt skipped");
        return;
    }
    let result = action.invoke().await;
    let satisfied = condition(&result);
    if !last.record(attempt, result, satisfied) {
        tracing::trace!(attempt, "result arrived after the run settled, discarded");
    }
    if satisfied {
        tracing::debug!(attempt, "stopping condition satisfied");
        stop.set();
    }
}
