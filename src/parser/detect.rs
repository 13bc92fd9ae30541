//! Wire-format detection from the top-level document shape.

use crate::utils::config::{OBSERVATIONS_KEY, RESOURCE_SPANS_KEY};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

/// Supported trace document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceFormat {
    /// Vendor observation export: `{ id, observations: [...] }`
    Observations,
    /// OTLP/JSON span export: `{ resourceSpans: [...] }`
    Otlp,
}

impl TraceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observations => "observations",
            Self::Otlp => "otlp",
        }
    }
}

/// Select a parser for a decoded document
///
/// **Public** - called by `parse_document` before dispatch
///
/// `observations` wins when a document carries both markers.
///
/// # Errors
/// * `ParseError::FormatUnrecognized` - not an object, or neither marker present
pub fn detect_format(document: &Value) -> Result<TraceFormat, ParseError> {
    let Some(obj) = document.as_object() else {
        debug!("Top-level document is not an object");
        return Err(ParseError::FormatUnrecognized);
    };

    let has_observations = obj.contains_key(OBSERVATIONS_KEY);
    let has_spans = obj.contains_key(RESOURCE_SPANS_KEY);

    match (has_observations, has_spans) {
        (true, true) => {
            warn!(
                "Document carries both `{}` and `{}`; parsing as observations",
                OBSERVATIONS_KEY, RESOURCE_SPANS_KEY
            );
            Ok(TraceFormat::Observations)
        }
        (true, false) => Ok(TraceFormat::Observations),
        (false, true) => Ok(TraceFormat::Otlp),
        (false, false) => Err(ParseError::FormatUnrecognized),
    }
}
