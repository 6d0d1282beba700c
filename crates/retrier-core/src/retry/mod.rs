//! Retry engine.
//!
//! An action is re-dispatched on a timed interval (optionally growing via a
//! backoff strategy) until a stopping condition accepts one of its results,
//! a maximum attempt count is reached, or an overall time budget expires.
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use retrier_core::Retry;
//!
//! # async fn demo() {
//! let counter = Arc::new(AtomicU64::new(0));
//! let outcome = Retry::with(move || {
//!     let counter = Arc::clone(&counter);
//!     async move { Ok::<_, Infallible>(counter.fetch_add(2, Ordering::SeqCst) + 2) }
//! })
//! .until(|r: &Result<u64, Infallible>| matches!(r, Ok(v) if *v >= 10))
//! .every(Duration::from_secs(1))
//! .within(Duration::from_secs(10))
//! .go()
//! .await;
//! assert_eq!(outcome.last_value(), Some(&10));
//! # }
//! ```

mod action;
mod backoff;
mod builder;
pub mod condition;
mod outcome;
mod run;
mod signal;
mod slot;

pub use action::{Action, AttemptFuture, Blocking, NoError};
pub use backoff::{Backoff, Exponential, Uniform};
pub use builder::{Dispatch, Retry};
pub use condition::Condition;
pub use outcome::Outcome;
