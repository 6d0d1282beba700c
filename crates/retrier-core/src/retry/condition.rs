//! Stopping conditions: predicates over an attempt's result.
//!
//! A condition returning `true` stops the loop successfully. Errors are data
//! here, so a condition may just as well stop on a particular failure.

use std::sync::Arc;

/// Shared, type-erased stopping condition.
pub type Condition<T, E> = Arc<dyn Fn(&Result<T, E>) -> bool + Send + Sync>;

/// Never satisfied; the loop runs until attempts or time run out.
pub fn never<T, E>() -> Condition<T, E> {
    Arc::new(|_| false)
}

/// Stop on the first `Ok`.
pub fn succeeded<T, E>() -> Condition<T, E> {
    Arc::new(|r| r.is_ok())
}

/// Stop on an `Ok` value matching `pred`.
pub fn value_matches<T, E, P>(pred: P) -> Condition<T, E>
where
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(move |r| matches!(r, Ok(v) if pred(v)))
}

/// Stop on an error matching `pred` (e.g. a permanent failure).
pub fn failed_with<T, E, P>(pred: P) -> Condition<T, E>
where
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(move |r| matches!(r, Err(e) if pred(e)))
}
