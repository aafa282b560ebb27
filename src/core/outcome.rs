//! Task results as a tagged outcome: immediate, awaitable, or callback-settled.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

/// Success callback handed to a [`Thenable`].
pub type Resolve<R> = Box<dyn FnOnce(R) + Send>;
/// Failure callback handed to a [`Thenable`].
pub type Reject<E> = Box<dyn FnOnce(E) + Send>;

/// Anything that settles by invoking one of two registered callbacks.
///
/// This is the capability the limiter looks for instead of a concrete future
/// type: a value that can be told "call this on success, that on failure".
/// Only the first callback invoked counts.
///
/// Any `FnOnce(Resolve<R>, Reject<E>) + Send` closure is a thenable:
///
/// ```rust,ignore
/// use prometheus_limiter::core::{Resolve, Reject, TaskOutcome};
///
/// let outcome: TaskOutcome<u32, String> = TaskOutcome::deferred(
///     |resolve: Resolve<u32>, _reject: Reject<String>| {
///         std::thread::spawn(move || resolve(42));
///     },
/// );
/// ```
pub trait Thenable<R, E>: Send {
    /// Register the settlement callbacks.
    fn then(self: Box<Self>, on_fulfilled: Resolve<R>, on_rejected: Reject<E>);
}

impl<R, E, F> Thenable<R, E> for F
where
    F: FnOnce(Resolve<R>, Reject<E>) + Send,
{
    fn then(self: Box<Self>, on_fulfilled: Resolve<R>, on_rejected: Reject<E>) {
        (*self)(on_fulfilled, on_rejected);
    }
}

/// What a task invocation hands back to the limiter.
pub enum TaskOutcome<R, E> {
    /// Already settled.
    Ready(Result<R, E>),
    /// Settles when the future completes.
    Pending(BoxFuture<'static, Result<R, E>>),
    /// Settles through the two-callback protocol.
    Deferred(Box<dyn Thenable<R, E>>),
}

impl<R, E> TaskOutcome<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    /// Immediate success.
    pub const fn ready(value: R) -> Self {
        Self::Ready(Ok(value))
    }

    /// Immediate failure.
    pub const fn failed(error: E) -> Self {
        Self::Ready(Err(error))
    }

    /// Wrap a future.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<R, E>> + Send + 'static,
    {
        Self::Pending(fut.boxed())
    }

    /// Wrap a callback-settled value.
    pub fn deferred<T>(thenable: T) -> Self
    where
        T: Thenable<R, E> + 'static,
    {
        Self::Deferred(Box::new(thenable))
    }

    /// Whether the outcome still has to be awaited.
    pub const fn is_pending(&self) -> bool {
        !matches!(self, Self::Ready(_))
    }

    /// Drive the outcome to its result.
    ///
    /// Resolves to `None` when a deferred outcome dropped both callbacks
    /// without calling either.
    pub async fn resolve(self) -> Option<Result<R, E>> {
        match self {
            Self::Ready(result) => Some(result),
            Self::Pending(fut) => Some(fut.await),
            Self::Deferred(thenable) => settle(thenable).await,
        }
    }
}

impl<R, E> From<Result<R, E>> for TaskOutcome<R, E> {
    fn from(result: Result<R, E>) -> Self {
        Self::Ready(result)
    }
}

impl<R, E> fmt::Debug for TaskOutcome<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(Ok(_)) => f.write_str("TaskOutcome::Ready(Ok(..))"),
            Self::Ready(Err(_)) => f.write_str("TaskOutcome::Ready(Err(..))"),
            Self::Pending(_) => f.write_str("TaskOutcome::Pending(..)"),
            Self::Deferred(_) => f.write_str("TaskOutcome::Deferred(..)"),
        }
    }
}

/// Bridge a thenable into a oneshot so it can be awaited.
async fn settle<R, E>(thenable: Box<dyn Thenable<R, E>>) -> Option<Result<R, E>>
where
    R: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel::<Result<R, E>>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let tx_err = Arc::clone(&tx);

    thenable.then(
        Box::new(move |value| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(Ok(value));
            }
        }),
        Box::new(move |error| {
            if let Some(tx) = tx_err.lock().take() {
                let _ = tx.send(Err(error));
            }
        }),
    );

    rx.await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_resolves_immediately() {
        let outcome: TaskOutcome<u8, ()> = TaskOutcome::ready(3);
        assert!(!outcome.is_pending());
        assert_eq!(futures::executor::block_on(outcome.resolve()), Some(Ok(3)));
    }

    #[test]
    fn pending_resolves_with_future_output() {
        let outcome: TaskOutcome<u8, &str> = TaskOutcome::pending(async { Err("boom") });
        assert!(outcome.is_pending());
        assert_eq!(
            futures::executor::block_on(outcome.resolve()),
            Some(Err("boom"))
        );
    }

    #[test]
    fn deferred_first_callback_wins() {
        let outcome: TaskOutcome<u8, &str> =
            TaskOutcome::deferred(|resolve: Resolve<u8>, reject: Reject<&str>| {
                reject("first");
                resolve(9);
            });
        assert_eq!(
            futures::executor::block_on(outcome.resolve()),
            Some(Err("first"))
        );
    }

    #[test]
    fn deferred_settles_from_another_thread() {
        let outcome: TaskOutcome<u8, ()> =
            TaskOutcome::deferred(|resolve: Resolve<u8>, _reject: Reject<()>| {
                std::thread::spawn(move || resolve(7));
            });
        assert_eq!(futures::executor::block_on(outcome.resolve()), Some(Ok(7)));
    }

    #[test]
    fn abandoned_deferred_resolves_to_none() {
        let outcome: TaskOutcome<u8, ()> =
            TaskOutcome::deferred(|_resolve: Resolve<u8>, _reject: Reject<()>| {});
        assert_eq!(futures::executor::block_on(outcome.resolve()), None);
    }
}
