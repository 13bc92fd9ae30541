//! Trace Canon
//!
//! Normalization of observability trace exports into one canonical,
//! format-independent run hierarchy.
//!
//! Two export shapes are understood:
//! - Observation exports (`{"id", "projectId", "observations": [...]}`)
//! - OTLP/JSON exports (`{"resourceSpans": [...]}`)
//!
//! Every record comes out with a repaired parent link and a deterministic
//! order path, so sorting by `order_path` reproduces the time-ordered
//! depth-first walk of the trace.
//!
//! ## Getting Started
//!
//! ```no_run
//! use trace_canon::{LocalFileTraceSource, TraceSource};
//!
//! let mut source = LocalFileTraceSource::new("trace.json")?;
//! let trace = source.trace()?;
//! for record in trace.records() {
//!     println!("{} {} {}", record.order_path, record.kind, record.name);
//! }
//! # Ok::<(), trace_canon::TraceError>(())
//! ```

pub mod aggregator;
pub mod model;
pub mod parser;
pub mod source;
pub mod utils;

// Re-export the main entry points
pub use aggregator::RepairReport;
pub use model::{AttributeMap, CanonicalRunRecord, CanonicalTrace, RunKind, Timestamp};
pub use parser::{parse_bytes, parse_document, TraceFormat};
pub use source::{LocalFileTraceSource, TraceSource};
pub use utils::{ParseError, SourceError, TraceError};
