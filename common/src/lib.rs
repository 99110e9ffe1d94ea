//! Shared plumbing for the monitor workspace: tracing bootstrap, span helpers,
//! correlation ids and wall-clock helpers.

pub mod logger;
pub mod time;

pub use logger::{TraceId, init_logger};
pub use time::now_ms;
