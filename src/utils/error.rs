//! Error types for the entire crate.
//!
//! We use `thiserror` for library-style errors, one enum per concern.
//! Anomalies that are repaired (skipped observations, broken parent links)
//! are never errors; they are logged and counted in a `RepairReport`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up or reading a trace source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Trace file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Trace path is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether retrying could succeed. Setup failures never do.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors that can occur during trace parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unrecognized trace format: expected `observations` or `resourceSpans` at top level")]
    FormatUnrecognized,

    #[error("Missing required field `{field}` in {context}")]
    MissingField { field: &'static str, context: String },

    #[error("Invalid timestamp {value}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("no spans found")]
    NoSpans,
}

impl ParseError {
    pub(crate) fn missing(field: &'static str, context: impl Into<String>) -> Self {
        Self::MissingField {
            field,
            context: context.into(),
        }
    }

    pub(crate) fn timestamp(value: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying could succeed. Parsing is deterministic, so never.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Any failure surfaced by a trace source
#[derive(Error, Debug)]
pub enum TraceError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl TraceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TraceError::Source(e) => e.is_retryable(),
            TraceError::Parse(e) => e.is_retryable(),
        }
    }
}
