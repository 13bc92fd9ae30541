//! Canonical, format-independent trace model.
//!
//! This module defines:
//! - `Timestamp`, the single absolute-time type
//! - `CanonicalRunRecord` and its `RunKind`
//! - `CanonicalTrace`, the aggregate handed to downstream consumers

pub mod run;
pub mod timestamp;
pub mod trace;

// Re-export main types
pub use run::{AttributeMap, CanonicalRunRecord, RunKind};
pub use timestamp::Timestamp;
pub use trace::CanonicalTrace;
