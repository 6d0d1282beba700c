//! Backoff strategies: delay to apply between attempt `n` and `n + 1`.

use std::time::Duration;

/// Computes the delay after an attempt from its 0-based index and the base
/// interval. Implementations must be pure.
pub trait Backoff: Send + Sync + 'static {
    fn delay(&self, attempt: u64, interval: Duration) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u64, Duration) -> Duration + Send + Sync + 'static,
{
    fn delay(&self, attempt: u64, interval: Duration) -> Duration {
        self(attempt, interval)
    }
}

/// Same delay between every pair of attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uniform;

impl Backoff for Uniform {
    fn delay(&self, _attempt: u64, interval: Duration) -> Duration {
        interval
    }
}

/// `interval * factor^attempt`, uncapped.
///
/// Results too large for a [`Duration`] saturate to `Duration::MAX`;
/// negative or NaN results become zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    pub factor: f64,
}

impl Exponential {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Backoff for Exponential {
    fn delay(&self, attempt: u64, interval: Duration) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = interval.as_nanos() as f64 * self.factor.powi(exp);
        if nanos.is_nan() || nanos <= 0.0 {
            return Duration::ZERO;
        }
        if nanos < u64::MAX as f64 {
            return Duration::from_nanos(nanos as u64);
        }
        Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(Duration::MAX)
    }
}
