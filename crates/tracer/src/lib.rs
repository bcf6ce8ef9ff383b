//! Host-side companions to the simulator core: the trace-line text
//! serializer and the memory-dump writer used by the `lc4-trace` binary.

/// Nonzero-memory dump writer.
pub mod dump;
/// Trace-line text serialization.
pub mod writer;

pub use dump::write_memory_dump;
pub use writer::{format_record, TextTraceWriter};

#[cfg(test)]
use tempfile as _;
