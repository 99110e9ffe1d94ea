mod init;
mod spans;
mod trace_id;

pub use init::init_logger;
pub use spans::{symbol_span, warn_if_slow, watcher_span};
pub use trace_id::TraceId;
