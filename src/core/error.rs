//! Error types for limiter operations.

use thiserror::Error;

/// Configuration errors produced by the limiter.
///
/// Task failures are never reported through this type; they travel on the
/// `error` channel instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimiterError {
    /// A handler was registered on a channel outside `iteration`, `error`, `done`.
    #[error("Channel: {0} is not valid")]
    InvalidChannel(String),
    /// Options failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// `start()` was called on a run that already started.
    #[error("limiter already started")]
    AlreadyStarted,
    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors surfaced by the strategies layered over a limiter run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError<E> {
    /// A task failed.
    #[error("task failed: {0}")]
    Task(E),
    /// Every task failed, none produced a value.
    #[error("No promises resolved")]
    NoneSucceeded,
    /// The run halted before any terminal signal reached the consumer.
    #[error("run interrupted before completion")]
    Interrupted,
    /// The limiter rejected its configuration.
    #[error(transparent)]
    Limiter(#[from] LimiterError),
}

impl<E> RunError<E> {
    /// Return the task error, if this is a task failure.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            Self::Task(e) => Some(e),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
