//! Bounded-concurrency limiter: window management, dispatch, and completion bookkeeping.
//!
//! A [`Limiter`] runs a task over every item of a [`Collection`] with at most
//! `limit` invocations in flight, and reports each completion on the
//! `iteration` / `error` channels and overall completion on `done`.
//!
//! Each invocation is handed to a [`Spawn`] implementation, so the task body
//! never runs inside the turn that dispatched it. Completions are processed one
//! at a time per run: counters, emission, and window refill happen under a
//! per-run serialization lock, which keeps event order consistent even when the
//! spawner drives tasks on several threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_limiter::core::{Limiter, LimiterOptions, TaskOutcome};
//! use prometheus_limiter::runtime::TokioSpawner;
//!
//! let limiter = Limiter::from_async(
//!     vec!["waiter", "check please"],
//!     |value, _key| async move { Ok::<_, String>(value.to_uppercase()) },
//!     LimiterOptions::new().with_limit(1),
//!     TokioSpawner::current(),
//! )?;
//!
//! limiter.on_iteration(|event| println!("{} -> {:?}", event.key, event.result_value));
//! limiter.on_error(|event| eprintln!("{} failed: {}", event.key, event.error));
//! limiter.on_done(|| println!("all done"));
//! limiter.start()?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::collection::{Collection, Key};
use super::error::LimiterError;
use super::events::{Channel, ErrorEvent, Event, Handler, Handlers, IterationEvent};
use super::outcome::TaskOutcome;

/// Abstraction for spawning task execution on a runtime.
///
/// Implementations must queue the future for a later turn of the scheduler;
/// polling it inline from `spawn` would re-enter the limiter.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Options recognized by a limiter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterOptions {
    /// Maximum number of in-flight invocations. `None` means unbounded.
    pub limit: Option<usize>,
    /// Whether the first failure halts the run.
    pub bail_on_error: bool,
}

impl Default for LimiterOptions {
    fn default() -> Self {
        Self {
            limit: None,
            bail_on_error: true,
        }
    }
}

impl LimiterOptions {
    /// Unbounded concurrency, bail on first error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of in-flight invocations.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Remove any concurrency cap.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.limit = None;
        self
    }

    /// Choose whether the first failure halts the run.
    #[must_use]
    pub const fn with_bail_on_error(mut self, bail_on_error: bool) -> Self {
        self.bail_on_error = bail_on_error;
        self
    }

    /// Validate option values.
    pub fn validate(&self) -> Result<(), LimiterError> {
        if self.limit == Some(0) {
            return Err(LimiterError::InvalidOptions(
                "limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn max_in_flight(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}

/// Lifecycle position of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Constructed, not started.
    Idle,
    /// Started and still dispatching or awaiting completions.
    Running,
    /// Every item completed and `done` was emitted.
    Done,
    /// Stopped explicitly or bailed out on the first failure.
    Halted,
}

/// Point-in-time view of a run's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Lifecycle position.
    pub state: RunState,
    /// Invocations currently in flight.
    pub concurrency: usize,
    /// Position of the next item to dispatch.
    pub current_index: usize,
    /// Invocations that completed, successfully or not.
    pub number_done: usize,
    /// Whether `stop()` is in effect.
    pub stopped: bool,
    /// Index of the first failed item, if any.
    pub failed_index: Option<usize>,
}

/// Cloneable handle that stops a run without keeping it alive.
///
/// Handlers that need to stop their own limiter should capture one of these
/// rather than a `Limiter` clone.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Stop further dispatch and emission.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether the run is stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

type TaskFn<V, R, E> = Box<dyn Fn(V, Key) -> TaskOutcome<R, E> + Send + Sync>;

/// Item selected for execution.
struct Dispatch<V> {
    index: usize,
    key: Key,
    value: V,
}

/// What a completion does once its own events are out.
enum Next<V> {
    Finish,
    Launch(Dispatch<V>),
    Wait,
}

/// Mutable counters owned by one run.
struct RunCounters<V> {
    /// Values are taken as they are dispatched.
    items: Vec<(Key, Option<V>)>,
    concurrency: usize,
    current_index: usize,
    number_done: usize,
    failed_index: Option<usize>,
    started: bool,
    finished: bool,
}

impl<V> RunCounters<V> {
    fn reserve_next(&mut self) -> Option<Dispatch<V>> {
        let index = self.current_index;
        let (key, slot) = self.items.get_mut(index)?;
        let value = slot.take()?;
        let key = key.clone();
        self.concurrency += 1;
        self.current_index += 1;
        Some(Dispatch { index, key, value })
    }
}

struct Shared<V, R, E, S> {
    run_id: Uuid,
    total: usize,
    options: LimiterOptions,
    task: TaskFn<V, R, E>,
    spawner: S,
    state: Mutex<RunCounters<V>>,
    stopped: Arc<AtomicBool>,
    handlers: RwLock<Handlers<R, E>>,
    /// Held while a completion is processed so events of one run never interleave.
    emission: Mutex<()>,
}

/// Runs a task over a collection with bounded concurrency.
///
/// A limiter is single-use: it is inert until [`start`](Self::start), drives
/// itself to `done` (or halts), and cannot be restarted.
pub struct Limiter<V, R, E, S> {
    shared: Arc<Shared<V, R, E, S>>,
}

impl<V, R, E, S> Clone for Limiter<V, R, E, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V, R, E, S> Limiter<V, R, E, S>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Build a limiter over `collection` running `task(value, key)` per item.
    pub fn new<C, F>(
        collection: C,
        task: F,
        options: LimiterOptions,
        spawner: S,
    ) -> Result<Self, LimiterError>
    where
        C: Into<Collection<V>>,
        F: Fn(V, Key) -> TaskOutcome<R, E> + Send + Sync + 'static,
    {
        options.validate()?;
        let items: Vec<(Key, Option<V>)> = collection
            .into()
            .into_entries()
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        let total = items.len();
        let run_id = Uuid::new_v4();
        tracing::debug!(
            run_id = %run_id,
            total,
            limit = ?options.limit,
            bail_on_error = options.bail_on_error,
            "limiter created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                run_id,
                total,
                options,
                task: Box::new(task),
                spawner,
                state: Mutex::new(RunCounters {
                    items,
                    concurrency: 0,
                    current_index: 0,
                    number_done: 0,
                    failed_index: None,
                    started: false,
                    finished: false,
                }),
                stopped: Arc::new(AtomicBool::new(false)),
                handlers: RwLock::new(Handlers::new()),
                emission: Mutex::new(()),
            }),
        })
    }

    /// Build a limiter whose task is an async function.
    pub fn from_async<C, F, Fut>(
        collection: C,
        task: F,
        options: LimiterOptions,
        spawner: S,
    ) -> Result<Self, LimiterError>
    where
        C: Into<Collection<V>>,
        F: Fn(V, Key) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        Self::new(
            collection,
            move |value, key| TaskOutcome::pending(task(value, key)),
            options,
            spawner,
        )
    }

    /// Register a handler by channel name.
    ///
    /// Replaces any handler already on the channel. An unrecognized name is
    /// rejected here, before anything is emitted.
    pub fn on<H>(&self, channel: &str, handler: H) -> Result<(), LimiterError>
    where
        H: Fn(Event<R, E>) + Send + Sync + 'static,
    {
        let channel: Channel = channel.parse()?;
        self.subscribe(channel, Arc::new(handler));
        Ok(())
    }

    /// Register the `iteration` handler.
    pub fn on_iteration<H>(&self, handler: H)
    where
        H: Fn(IterationEvent<R>) + Send + Sync + 'static,
    {
        self.subscribe(
            Channel::Iteration,
            Arc::new(move |event| {
                if let Event::Iteration(e) = event {
                    handler(e);
                }
            }),
        );
    }

    /// Register the `error` handler.
    pub fn on_error<H>(&self, handler: H)
    where
        H: Fn(ErrorEvent<E>) + Send + Sync + 'static,
    {
        self.subscribe(
            Channel::Error,
            Arc::new(move |event| {
                if let Event::Error(e) = event {
                    handler(e);
                }
            }),
        );
    }

    /// Register the `done` handler.
    pub fn on_done<H>(&self, handler: H)
    where
        H: Fn() + Send + Sync + 'static,
    {
        self.subscribe(
            Channel::Done,
            Arc::new(move |event| {
                if matches!(event, Event::Done) {
                    handler();
                }
            }),
        );
    }

    fn subscribe(&self, channel: Channel, handler: Handler<R, E>) {
        self.shared.handlers.write().set(channel, handler);
    }

    /// Begin the run.
    ///
    /// An empty collection emits `done` before returning. Otherwise the initial
    /// window of `min(limit, len)` items is dispatched; none of their tasks run
    /// before this call returns.
    pub fn start(&self) -> Result<(), LimiterError> {
        let shared = &self.shared;

        let initial = {
            let mut state = shared.state.lock();
            if state.started {
                return Err(LimiterError::AlreadyStarted);
            }
            state.started = true;
            shared.stopped.store(false, Ordering::SeqCst);

            if state.items.is_empty() {
                state.finished = true;
                None
            } else {
                let window = shared.options.max_in_flight().min(shared.total);
                let batch: Vec<Dispatch<V>> =
                    (0..window).filter_map(|_| state.reserve_next()).collect();
                Some(batch)
            }
        };

        match initial {
            None => {
                tracing::info!(run_id = %shared.run_id, "empty collection, done");
                shared.emit(Event::Done);
            }
            Some(batch) => {
                tracing::info!(
                    run_id = %shared.run_id,
                    window = batch.len(),
                    total = shared.total,
                    "limiter started"
                );
                for dispatch in batch {
                    Shared::launch(shared, dispatch);
                }
            }
        }
        Ok(())
    }

    /// Stop dispatching and emitting.
    ///
    /// Tasks already in flight keep running and are still counted when they
    /// finish, but produce no further events.
    pub fn stop(&self) {
        tracing::info!(run_id = %self.shared.run_id, "limiter stopped");
        self.shared.stopped.store(true, Ordering::SeqCst);
    }

    /// Handle that stops this run without holding it alive.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: Arc::clone(&self.shared.stopped),
        }
    }

    /// Current counters and lifecycle position.
    pub fn snapshot(&self) -> RunSnapshot {
        let shared = &self.shared;
        let stopped = shared.is_stopped();
        let state = shared.state.lock();
        let run_state = if !state.started {
            RunState::Idle
        } else if state.finished {
            RunState::Done
        } else if stopped || (state.failed_index.is_some() && shared.options.bail_on_error) {
            RunState::Halted
        } else {
            RunState::Running
        };
        RunSnapshot {
            state: run_state,
            concurrency: state.concurrency,
            current_index: state.current_index,
            number_done: state.number_done,
            stopped,
            failed_index: state.failed_index,
        }
    }

    /// Identifier attached to this run's log records.
    pub fn run_id(&self) -> Uuid {
        self.shared.run_id
    }

    /// Number of items in the run.
    pub fn len(&self) -> usize {
        self.shared.total
    }

    /// Whether the run has no items.
    pub fn is_empty(&self) -> bool {
        self.shared.total == 0
    }

    /// Configured concurrency cap.
    pub fn limit(&self) -> Option<usize> {
        self.shared.options.limit
    }

    /// Whether the first failure halts the run.
    pub fn bail_on_error(&self) -> bool {
        self.shared.options.bail_on_error
    }
}

impl<V, E, S> Limiter<V, V, E, S>
where
    V: Send + 'static,
    E: Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Build a limiter whose task returns each value unchanged.
    pub fn identity<C>(
        collection: C,
        options: LimiterOptions,
        spawner: S,
    ) -> Result<Self, LimiterError>
    where
        C: Into<Collection<V>>,
    {
        Self::new(collection, |value, _key| TaskOutcome::ready(value), options, spawner)
    }
}

impl<V, R, E, S> Shared<V, R, E, S>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn emit(&self, event: Event<R, E>) {
        let handler = self.handlers.read().get(event.channel());
        if let Some(handler) = handler {
            handler(event);
        }
    }

    /// Hand one item to the spawner; the task runs on a later turn.
    fn launch(this: &Arc<Self>, dispatch: Dispatch<V>) {
        let shared = Arc::clone(this);
        tracing::debug!(
            run_id = %this.run_id,
            index = dispatch.index,
            "dispatching item {}",
            dispatch.key
        );

        this.spawner.spawn(async move {
            let Dispatch { index, key, value } = dispatch;
            let outcome = (shared.task)(value, key.clone());
            match outcome.resolve().await {
                Some(result) => Self::complete(&shared, index, key, result),
                None => tracing::warn!(
                    run_id = %shared.run_id,
                    index,
                    "task for key {} dropped its callbacks without settling",
                    key
                ),
            }
        });
    }

    /// Bookkeeping and emission for one finished invocation.
    fn complete(this: &Arc<Self>, index: usize, key: Key, result: Result<R, E>) {
        let _serial = this.emission.lock();
        let bail = this.options.bail_on_error;

        {
            let mut state = this.state.lock();
            state.concurrency = state.concurrency.saturating_sub(1);
            state.number_done += 1;

            if state.failed_index.is_some() && bail {
                tracing::debug!(
                    run_id = %this.run_id,
                    index,
                    "completion after bail-out suppressed"
                );
                return;
            }
            if this.is_stopped() {
                tracing::debug!(run_id = %this.run_id, index, "completion after stop suppressed");
                return;
            }
            if result.is_err() && state.failed_index.is_none() {
                state.failed_index = Some(index);
            }
        }

        let result_value = match result {
            Ok(value) => {
                tracing::debug!(run_id = %this.run_id, index, "item {} completed", key);
                Some(value)
            }
            Err(error) => {
                if bail {
                    tracing::warn!(
                        run_id = %this.run_id,
                        index,
                        "item {} failed, halting run",
                        key
                    );
                } else {
                    tracing::warn!(run_id = %this.run_id, index, "item {} failed", key);
                }
                this.emit(Event::Error(ErrorEvent {
                    key: key.clone(),
                    error,
                    index,
                }));
                if bail || this.is_stopped() {
                    return;
                }
                None
            }
        };

        this.emit(Event::Iteration(IterationEvent {
            key,
            result_value,
            index,
        }));
        if this.is_stopped() {
            return;
        }

        let next = {
            let mut state = this.state.lock();
            if state.number_done >= this.total {
                state.finished = true;
                Next::Finish
            } else if state.concurrency < this.options.max_in_flight()
                && state.current_index < this.total
            {
                state.reserve_next().map_or(Next::Wait, Next::Launch)
            } else {
                Next::Wait
            }
        };

        match next {
            Next::Finish => {
                tracing::info!(run_id = %this.run_id, total = this.total, "limiter done");
                this.emit(Event::Done);
            }
            Next::Launch(dispatch) => Self::launch(this, dispatch),
            Next::Wait => {}
        }
    }
}
