//! The persisted, size-bounded event log and its single writer.

mod bounded;
mod writer;

pub use bounded::BoundedLog;
pub use writer::EventLogWriter;
