//! Aggregation of parsed records into a canonical trace.
//!
//! This module transforms per-format parser output into:
//! - A repaired, acyclic parent graph
//! - Deterministic order paths for every record
//! - The final `CanonicalTrace` with summary bounds

pub mod assembler;
pub mod hierarchy;

// Re-export main types and functions
pub use assembler::{assemble_trace, trace_bounds};
pub use hierarchy::{build_hierarchy, RepairReport};
