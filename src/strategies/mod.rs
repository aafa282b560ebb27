//! Result strategies layered over a limiter run.
//!
//! Each strategy supplies a task and options, subscribes to the limiter's
//! channels, and reduces the events into its own return contract. Results are
//! recorded by `index`/`key`, never by completion order.

mod collect;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::{Collection, Key, Limiter, LimiterOptions, RunError};
use crate::runtime::TokioSpawner;

use collect::Settle;

/// Run `task` over a sequence and return the results in input order.
///
/// The first `error` event rejects the whole call.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn map<V, R, E, F, Fut>(
    collection: Vec<V>,
    task: F,
    options: LimiterOptions,
) -> Result<Vec<R>, RunError<E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(V, Key) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    map_collection(Collection::sequence(collection), task, options).await
}

/// Run `task` over any collection and return the results by dispatch index.
///
/// A keyed collection yields its values in entry order, dropping the keys;
/// use [`map_values`] to keep them.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn map_collection<V, R, E, F, Fut>(
    collection: Collection<V>,
    task: F,
    options: LimiterOptions,
) -> Result<Vec<R>, RunError<E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(V, Key) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let limiter = Limiter::from_async(collection, task, options, TokioSpawner::current())?;
    let slots: Arc<Mutex<Vec<Option<R>>>> =
        Arc::new(Mutex::new((0..limiter.len()).map(|_| None).collect()));
    let (settle, rx) = Settle::<Result<(), E>>::channel();

    {
        let settle = Arc::clone(&settle);
        limiter.on_error(move |event| settle.send(Err(event.error)));
    }
    {
        let slots = Arc::clone(&slots);
        limiter.on_iteration(move |event| {
            if let Some(value) = event.result_value {
                slots.lock()[event.index] = Some(value);
            }
        });
    }
    limiter.on_done(move || settle.send(Ok(())));
    limiter.start()?;
    drop(limiter);

    match rx.await {
        Ok(Ok(())) => Ok(slots.lock().drain(..).flatten().collect()),
        Ok(Err(error)) => Err(RunError::Task(error)),
        Err(_) => Err(RunError::Interrupted),
    }
}

/// Run `task` over keyed entries and return the results by key.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn map_values<I, K, V, R, E, F, Fut>(
    entries: I,
    task: F,
    options: LimiterOptions,
) -> Result<HashMap<String, R>, RunError<E>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(V, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let collection = Collection::keyed(entries);
    let limiter = Limiter::from_async(
        collection,
        move |value, key: Key| task(value, key.to_string()),
        options,
        TokioSpawner::current(),
    )?;
    let output: Arc<Mutex<HashMap<String, R>>> =
        Arc::new(Mutex::new(HashMap::with_capacity(limiter.len())));
    let (settle, rx) = Settle::<Result<(), E>>::channel();

    {
        let settle = Arc::clone(&settle);
        limiter.on_error(move |event| settle.send(Err(event.error)));
    }
    {
        let output = Arc::clone(&output);
        limiter.on_iteration(move |event| {
            if let Some(value) = event.result_value {
                output.lock().insert(event.key.to_string(), value);
            }
        });
    }
    limiter.on_done(move || settle.send(Ok(())));
    limiter.start()?;
    drop(limiter);

    match rx.await {
        Ok(Ok(())) => Ok(std::mem::take(&mut *output.lock())),
        Ok(Err(error)) => Err(RunError::Task(error)),
        Err(_) => Err(RunError::Interrupted),
    }
}

/// Await every future with bounded concurrency; results in input order.
///
/// Plain values can ride along as `futures::future::ok(value)`, and deferred
/// work as an `async move` block calling the function.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn all<Fut, R, E>(
    futures: Vec<Fut>,
    options: LimiterOptions,
) -> Result<Vec<R>, RunError<E>>
where
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    map(futures, |fut, _key| fut, options).await
}

/// Resolve to `true` once every task succeeded; reject on the first failure.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn every<V, R, E, F, Fut>(
    collection: Vec<V>,
    task: F,
    options: LimiterOptions,
) -> Result<bool, RunError<E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(V, Key) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let limiter = Limiter::from_async(collection, task, options, TokioSpawner::current())?;
    let (settle, rx) = Settle::<Result<bool, RunError<E>>>::channel();

    {
        let settle = Arc::clone(&settle);
        limiter.on_error(move |event| settle.send(Err(RunError::Task(event.error))));
    }
    limiter.on_done(move || settle.send(Ok(true)));
    limiter.start()?;
    drop(limiter);

    rx.await.unwrap_or(Err(RunError::Interrupted))
}

/// Resolve to `true` as soon as one task succeeds.
///
/// Failures never halt the run; the first success stops further dispatch.
/// If every task fails the call rejects with [`RunError::NoneSucceeded`].
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn any<V, R, E, F, Fut>(
    collection: Vec<V>,
    task: F,
    options: LimiterOptions,
) -> Result<bool, RunError<E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(V, Key) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let options = options.with_bail_on_error(false);
    let limiter = Limiter::from_async(collection, task, options, TokioSpawner::current())?;
    let stop = limiter.stop_handle();
    let (settle, rx) = Settle::<Result<bool, RunError<E>>>::channel();

    {
        let settle = Arc::clone(&settle);
        limiter.on_iteration(move |event| {
            if event.result_value.is_none() {
                return;
            }
            stop.stop();
            settle.send(Ok(true));
        });
    }
    limiter.on_done(move || settle.send(Err(RunError::NoneSucceeded)));
    limiter.start()?;
    drop(limiter);

    rx.await.unwrap_or(Err(RunError::Interrupted))
}

/// Resolve after `duration`.
pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}
