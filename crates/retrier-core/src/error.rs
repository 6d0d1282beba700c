//! Errors raised around the engine (runtime setup, settings validation).
//!
//! Failures of the retried action are not errors here: they are data handed
//! to the stopping condition and reported in the [`Outcome`](crate::Outcome).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError {
    /// The blocking entry point could not build its tokio runtime.
    #[error("failed to start retry runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A settings value is outside the range the engine can honour.
    #[error("invalid retry settings: {0}")]
    InvalidSettings(String),
}
