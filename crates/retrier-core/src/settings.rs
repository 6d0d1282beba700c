//! Plain-data retry settings.
//!
//! The builder takes closures and trait objects; `RetrySettings` is the
//! serializable subset (timing, limits, backoff kind) that front ends such as
//! the CLI fill in and echo back in reports.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RetryError;
use crate::retry::{Action, Dispatch, Exponential, Retry, Uniform};

/// Backoff strategy selectable from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Uniform,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Base interval between attempts, in milliseconds.
    pub interval_ms: u64,
    /// Overall time budget in milliseconds (None = unbounded).
    #[serde(default)]
    pub within_ms: Option<u64>,
    /// Maximum attempts (None = unbounded).
    #[serde(default)]
    pub max_attempts: Option<u64>,
    #[serde(default)]
    pub backoff: BackoffKind,
    /// Growth factor, used when `backoff` is exponential.
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub dispatch: Dispatch,
}

fn default_factor() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            within_ms: None,
            max_attempts: None,
            backoff: BackoffKind::Uniform,
            factor: default_factor(),
            dispatch: Dispatch::Concurrent,
        }
    }
}

impl RetrySettings {
    /// Reject values the engine cannot turn into meaningful delays.
    pub fn validate(&self) -> Result<(), RetryError> {
        if self.backoff == BackoffKind::Exponential
            && !(self.factor.is_finite() && self.factor > 0.0)
        {
            return Err(RetryError::InvalidSettings(format!(
                "exponential factor must be a positive finite number, got {}",
                self.factor
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn within(&self) -> Option<Duration> {
        self.within_ms.map(Duration::from_millis)
    }

    /// Copy these settings onto a builder. Unset limits keep the builder's
    /// defaults.
    pub fn apply<A: Action>(&self, retry: Retry<A>) -> Retry<A> {
        let mut retry = retry.every(self.interval()).dispatch(self.dispatch);
        if let Some(within) = self.within() {
            retry = retry.within(within);
        }
        if let Some(max) = self.max_attempts {
            retry = retry.max_attempts(max);
        }
        match self.backoff {
            BackoffKind::Uniform => retry.backoff(Uniform),
            BackoffKind::Exponential => retry.backoff(Exponential::new(self.factor)),
        }
    }
}
