//! # Prometheus Limiter
//!
//! A bounded-concurrency task runner for the Prometheus AI Platform.
//!
//! Given a collection of work items and a per-item task, a [`core::Limiter`]
//! runs the tasks with at most `limit` in flight, reports every completion
//! individually, detects overall completion, and applies a configurable
//! bail-on-error policy.
//!
//! ## Core Problem Solved
//!
//! Fan-out workloads (embedding batches, tool calls, crawler fetches) need a
//! concurrency cap and per-item reporting without handing control of the
//! event loop to the fan-out itself:
//!
//! - **Window filling**: items are dispatched in collection order, refilling the
//!   window as invocations finish
//! - **Per-item events**: `iteration`, `error`, and `done` channels with the
//!   original key and dispatch index
//! - **Bail-out**: the first failure halts dispatch and emission by default
//! - **Cooperative stop**: `stop()` halts dispatch and emission; in-flight work
//!   still runs to completion
//! - **Never blocks**: each task starts on a later scheduler turn, so a large
//!   initial window does not monopolize the runtime
//!
//! ## Limiter
//!
//! ```rust,ignore
//! use prometheus_limiter::core::{Limiter, LimiterOptions};
//! use prometheus_limiter::runtime::TokioSpawner;
//!
//! let limiter = Limiter::from_async(
//!     vec!["a", "b", "c"],
//!     |value, key| async move { Ok::<_, String>(format!("{key}:{value}")) },
//!     LimiterOptions::new().with_limit(2),
//!     TokioSpawner::current(),
//! )?;
//!
//! limiter.on_iteration(|event| tracing::info!(index = event.index, "{:?}", event.result_value));
//! limiter.on_error(|event| tracing::warn!("{} failed: {}", event.key, event.error));
//! limiter.on_done(|| tracing::info!("done"));
//! limiter.start()?;
//! ```
//!
//! ## Strategies
//!
//! For the common reductions, use the helpers in [`strategies`]:
//!
//! ```rust,ignore
//! use prometheus_limiter::core::LimiterOptions;
//! use prometheus_limiter::strategies;
//!
//! let lengths = strategies::map(
//!     vec!["waiter", "check please"],
//!     |value, _key| async move { Ok::<_, String>(value.len()) },
//!     LimiterOptions::new().with_limit(1),
//! )
//! .await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/limiter_test.rs` - Limiter state machine integration tests
//! - `tests/strategies_test.rs` - Strategy reductions

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core limiter state machine, task outcomes, and events.
pub mod core;
/// Configuration models for limiter options.
pub mod config;
/// Runtime adapters that execute dispatched tasks.
pub mod runtime;
/// Reductions of a limiter run into arrays, maps, and booleans.
#[cfg(feature = "tokio-runtime")]
pub mod strategies;
/// Shared utilities.
pub mod util;
