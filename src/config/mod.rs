//! Configuration models for limiter runs.

pub mod limiter;

pub use limiter::{load_from_env, LimiterConfig};
