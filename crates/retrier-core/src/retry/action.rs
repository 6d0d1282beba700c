//! The retried operation and adapters into its shape.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by one invocation of an [`Action`].
pub type AttemptFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// An operation the engine invokes once per attempt.
///
/// Implemented for every `Fn() -> impl Future<Output = Result<T, E>>`
/// closure, so most callers never name this trait.
pub trait Action: Send + Sync + 'static {
    type Value: Send + 'static;
    type Error: Send + 'static;

    /// Start one invocation. The engine spawns the returned future.
    fn invoke(&self) -> AttemptFuture<Self::Value, Self::Error>;
}

impl<F, Fut, T, E> Action for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Value = T;
    type Error = E;

    fn invoke(&self) -> AttemptFuture<T, E> {
        Box::pin((self)())
    }
}

/// Wraps an action that cannot fail; every invocation returns `Ok`.
pub struct NoError<F>(pub F);

impl<F, Fut, T> Action for NoError<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    type Value = T;
    type Error = Infallible;

    fn invoke(&self) -> AttemptFuture<T, Infallible> {
        let fut = (self.0)();
        Box::pin(async move { Ok(fut.await) })
    }
}

/// Wraps a synchronous action; each invocation runs on tokio's blocking pool
/// so a slow call never stalls the tick loop.
pub struct Blocking<F>(Arc<F>);

impl<F> Blocking<F> {
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

impl<F, T, E> Action for Blocking<F>
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Value = T;
    type Error = E;

    fn invoke(&self) -> AttemptFuture<T, E> {
        let f = Arc::clone(&self.0);
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || f()).await {
                Ok(result) => result,
                Err(err) => match err.try_into_panic() {
                    Ok(payload) => std::panic::resume_unwind(payload),
                    // Runtime is shutting down; this attempt will never report.
                    Err(_) => std::future::pending().await,
                },
            }
        })
    }
}
