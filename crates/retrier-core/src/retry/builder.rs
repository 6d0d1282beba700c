//! Fluent configuration of a retry run.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::backoff::{Backoff, Uniform};
use super::condition::{self, Condition};

/// How the tick loop treats an attempt it has dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Fire and forget: the loop paces itself on the backoff delay alone,
    /// so a slow action may overlap with the next attempts.
    #[default]
    Concurrent,
    /// The loop waits for the attempt to finish before sleeping; at most one
    /// invocation is in flight.
    Serial,
}

/// Retry configuration. Consumed by [`Retry::go`], so it cannot change once
/// a run has started.
///
/// No setter validates its input: a zero interval or zero max attempts are
/// accepted and give degenerate but defined behaviour.
pub struct Retry<A: Action> {
    pub(crate) action: Arc<A>,
    pub(crate) condition: Condition<A::Value, A::Error>,
    pub(crate) interval: Duration,
    /// `None` = unbounded.
    pub(crate) duration: Option<Duration>,
    pub(crate) max_attempts: u64,
    pub(crate) backoff: Arc<dyn Backoff>,
    pub(crate) dispatch: Dispatch,
}

impl<A: Action> Retry<A> {
    /// Start configuring a run of `action`.
    pub fn with(action: A) -> Self {
        Self {
            action: Arc::new(action),
            condition: condition::never(),
            interval: Duration::ZERO,
            duration: None,
            max_attempts: u64::MAX,
            backoff: Arc::new(Uniform),
            dispatch: Dispatch::Concurrent,
        }
    }

    /// Stop successfully once `condition` accepts an attempt's result.
    pub fn until<C>(mut self, condition: C) -> Self
    where
        C: Fn(&Result<A::Value, A::Error>) -> bool + Send + Sync + 'static,
    {
        self.condition = Arc::new(condition);
        self
    }

    /// Use a prebuilt condition (see [`condition`](super::condition)).
    pub fn until_condition(mut self, condition: Condition<A::Value, A::Error>) -> Self {
        self.condition = condition;
        self
    }

    /// Base interval between attempts, fed to the backoff strategy.
    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overall time budget of the run.
    pub fn within(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn max_attempts(mut self, max: u64) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn backoff<B: Backoff>(mut self, strategy: B) -> Self {
        self.backoff = Arc::new(strategy);
        self
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}

impl<A: Action> std::fmt::Debug for Retry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("interval", &self.interval)
            .field("duration", &self.duration)
            .field("max_attempts", &self.max_attempts)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
