//! Trace parsing for every supported wire format.
//!
//! This module handles:
//! - Detecting the document format from its top-level shape
//! - Normalizing timestamps, attributes and operation kinds
//! - Building canonical run records from observations or spans
//! - Handing the records to the aggregator for hierarchy repair

pub mod attributes;
pub mod classify;
pub mod detect;
pub mod observations;
pub mod otlp;
pub mod timestamp;

// Re-export main types
pub use detect::{detect_format, TraceFormat};
pub use observations::{parse_observation, parse_observation_export};
pub use otlp::{parse_otlp_export, parse_span};
pub use timestamp::{parse_iso_timestamp, parse_unix_nanos};

use crate::aggregator::assemble_trace;
use crate::model::{CanonicalRunRecord, CanonicalTrace};
use crate::utils::error::ParseError;
use log::debug;
use serde_json::Value;

/// UTF-8 byte order mark, tolerated at the start of a file
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parsed trace data before hierarchy repair (internal representation)
#[derive(Debug, Clone)]
pub struct ParsedTrace {
    pub trace_id: String,
    pub project: String,
    pub format: TraceFormat,
    /// Records with raw, unvalidated parent ids and empty order paths
    pub records: Vec<CanonicalRunRecord>,
    /// Raw units dropped by per-record validation
    pub skipped: usize,
}

/// Parse a decoded document into a canonical trace
///
/// **Public** - main in-memory entry point
///
/// # Arguments
/// * `document` - Decoded JSON document
/// * `trace_id` - Trace id for formats that carry none at top level (OTLP);
///   ignored for observation exports
///
/// # Errors
/// * `ParseError::FormatUnrecognized` - neither format marker is present
/// * Any error from the format-specific parser or the assembler
pub fn parse_document(
    document: &Value,
    trace_id: Option<&str>,
) -> Result<CanonicalTrace, ParseError> {
    let format = detect_format(document)?;
    debug!("Detected trace format: {}", format.as_str());

    let parsed = match format {
        TraceFormat::Observations => parse_observation_export(document)?,
        TraceFormat::Otlp => parse_otlp_export(document, trace_id)?,
    };

    assemble_trace(parsed)
}

/// Decode raw bytes as JSON and parse them
///
/// **Public** - used by trace sources that hold file or network bytes
///
/// # Errors
/// * `ParseError::Decode` - bytes are not valid JSON
/// * Anything `parse_document` returns
pub fn parse_bytes(bytes: &[u8], trace_id: Option<&str>) -> Result<CanonicalTrace, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let document: Value = serde_json::from_slice(bytes)?;
    parse_document(&document, trace_id)
}
