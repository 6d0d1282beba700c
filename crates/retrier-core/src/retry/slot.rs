//! Single-slot handoff of the latest attempt result.
//!
//! Attempt tasks write, the coordinator takes once after the race. A result
//! accepted by the stopping condition settles the slot: stragglers finishing
//! afterwards do not replace it.

use std::sync::{Arc, Mutex, MutexGuard};

struct Entry<T, E> {
    attempt: u64,
    result: Result<T, E>,
}

struct Inner<T, E> {
    latest: Option<Entry<T, E>>,
    settled: bool,
}

pub(crate) struct LastResult<T, E>(Arc<Mutex<Inner<T, E>>>);

impl<T, E> Clone for LastResult<T, E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T, E> LastResult<T, E> {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(Inner {
            latest: None,
            settled: false,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        // Writers never panic while holding the lock; recover the data anyway.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an attempt's result. Returns `false` if the slot was already
    /// settled and the result was dropped.
    pub(crate) fn record(&self, attempt: u64, result: Result<T, E>, satisfied: bool) -> bool {
        let mut inner = self.lock();
        if inner.settled {
            return false;
        }
        inner.latest = Some(Entry { attempt, result });
        inner.settled = satisfied;
        true
    }

    /// Take the recorded result: `(attempt index, result, satisfied)`.
    pub(crate) fn take(&self) -> (Option<(u64, Result<T, E>)>, bool) {
        let mut inner = self.lock();
        let latest = inner.latest.take().map(|e| (e.attempt, e.result));
        (latest, inner.settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins_until_settled() {
        let slot = LastResult::<i32, ()>::new();
        assert!(slot.record(0, Ok(1), false));
        assert!(slot.record(1, Ok(2), true));
        assert!(!slot.record(2, Ok(3), false));
        let (latest, settled) = slot.take();
        assert_eq!(latest, Some((1, Ok(2))));
        assert!(settled);
    }

    #[test]
    fn empty_slot() {
        let slot = LastResult::<i32, ()>::new();
        let (latest, settled) = slot.take();
        assert!(latest.is_none());
        assert!(!settled);
    }
}
