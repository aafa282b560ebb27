//! Event channels, payloads, and the three-slot handler registry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::collection::Key;
use super::error::LimiterError;

/// Notification channels a limiter emits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// An item completed.
    Iteration,
    /// An item failed.
    Error,
    /// Every item completed.
    Done,
}

impl Channel {
    /// All recognized channels.
    pub const ALL: [Self; 3] = [Self::Iteration, Self::Done, Self::Error];

    /// Channel name as used in registrations.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iteration => "iteration",
            Self::Error => "error",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| LimiterError::InvalidChannel(s.to_owned()))
    }
}

/// Payload of an `iteration` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationEvent<R> {
    /// Key of the item in the original collection.
    pub key: Key,
    /// Value produced by the task; `None` for a failed item when the run does
    /// not bail on error.
    pub result_value: Option<R>,
    /// Position of the item in dispatch order.
    pub index: usize,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent<E> {
    /// Key of the failing item.
    pub key: Key,
    /// The task failure.
    pub error: E,
    /// Position of the failing item in dispatch order.
    pub index: usize,
}

/// Anything a limiter emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<R, E> {
    /// An item completed.
    Iteration(IterationEvent<R>),
    /// An item failed.
    Error(ErrorEvent<E>),
    /// Every item completed.
    Done,
}

impl<R, E> Event<R, E> {
    /// Channel this event is emitted on.
    pub const fn channel(&self) -> Channel {
        match self {
            Self::Iteration(_) => Channel::Iteration,
            Self::Error(_) => Channel::Error,
            Self::Done => Channel::Done,
        }
    }
}

/// Registered handler callback.
pub type Handler<R, E> = Arc<dyn Fn(Event<R, E>) + Send + Sync>;

/// Fixed record of one optional handler per channel.
pub(crate) struct Handlers<R, E> {
    iteration: Option<Handler<R, E>>,
    error: Option<Handler<R, E>>,
    done: Option<Handler<R, E>>,
}

impl<R, E> Handlers<R, E> {
    pub(crate) const fn new() -> Self {
        Self {
            iteration: None,
            error: None,
            done: None,
        }
    }

    /// Install a handler, replacing any previous one on the channel.
    pub(crate) fn set(&mut self, channel: Channel, handler: Handler<R, E>) {
        let slot = match channel {
            Channel::Iteration => &mut self.iteration,
            Channel::Error => &mut self.error,
            Channel::Done => &mut self.done,
        };
        *slot = Some(handler);
    }

    pub(crate) fn get(&self, channel: Channel) -> Option<Handler<R, E>> {
        match channel {
            Channel::Iteration => self.iteration.clone(),
            Channel::Error => self.error.clone(),
            Channel::Done => self.done.clone(),
        }
    }
}
