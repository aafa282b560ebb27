//! Core limiter state machine, task outcomes, and event surface.

pub mod collection;
pub mod error;
pub mod events;
pub mod limiter;
pub mod outcome;

pub use collection::{Collection, Key};
pub use error::{AppResult, LimiterError, RunError};
pub use events::{Channel, ErrorEvent, Event, Handler, IterationEvent};
pub use limiter::{Limiter, LimiterOptions, RunSnapshot, RunState, Spawn, StopHandle};
pub use outcome::{Reject, Resolve, TaskOutcome, Thenable};
