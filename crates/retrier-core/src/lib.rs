pub mod error;
pub mod logging;
pub mod retry;
pub mod settings;

pub use error::RetryError;
pub use retry::{
    Action, Backoff, Blocking, Dispatch, Exponential, NoError, Outcome, Retry, Uniform,
};
pub use settings::{BackoffKind, RetrySettings};
