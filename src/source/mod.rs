//! Trace sources: where document bytes come from.

pub mod local_file;

pub use local_file::LocalFileTraceSource;

use crate::model::CanonicalTrace;
use crate::utils::error::TraceError;

/// A provider of exactly one canonical trace
///
/// Retrieval is idempotent: the first call parses, later calls return the
/// same cached trace. `&mut self` means calls on one instance are serialized
/// by the borrow checker; separate instances share nothing.
pub trait TraceSource {
    fn trace(&mut self) -> Result<&CanonicalTrace, TraceError>;
}
