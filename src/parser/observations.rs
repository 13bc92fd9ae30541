//! Parser for vendor observation exports.
//!
//! Document shape:
//! `{ id, projectId?, observations: [{ id, name, type, startTime, endTime?, parentObservationId?, ... }] }`
//!
//! Validation is per record: an observation lacking `id`, `name`, `type` or
//! `startTime` is skipped and logged, never fatal. The trace id itself is mandatory.

use super::classify::classify_observation;
use super::detect::TraceFormat;
use super::timestamp::parse_iso_timestamp;
use super::ParsedTrace;
use crate::model::{AttributeMap, CanonicalRunRecord, Timestamp};
use crate::utils::config::{
    OBSERVATIONS_KEY, OBSERVATION_ERROR_LEVEL, OBSERVATION_METADATA_FIELDS, UNKNOWN_ERROR,
    UNKNOWN_PROJECT,
};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::Value;

/// Key under which non-object input/output payloads are wrapped
const PAYLOAD_VALUE_KEY: &str = "value";

/// Parse a whole observation export
///
/// **Public** - dispatched to by `parse_document`
///
/// # Arguments
/// * `document` - Decoded top-level JSON object
///
/// # Returns
/// Trace id, project and every well-formed observation as a canonical record
///
/// # Errors
/// * `ParseError::MissingField` - no top-level `id`
/// * `ParseError::InvalidFormat` - `observations` is not a list
/// * `ParseError::InvalidTimestamp` - an observation timestamp is malformed
pub fn parse_observation_export(document: &Value) -> Result<ParsedTrace, ParseError> {
    let trace_id = match document.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ParseError::missing("id", "observation export")),
    };

    let project = document
        .get("projectId")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .unwrap_or(UNKNOWN_PROJECT)
        .to_string();

    let observations = document
        .get(OBSERVATIONS_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("`{}` must be a list", OBSERVATIONS_KEY))
        })?;

    debug!(
        "Parsing {} observations for trace {}",
        observations.len(),
        trace_id
    );

    let mut records = Vec::with_capacity(observations.len());
    let mut skipped = 0;

    for (index, raw) in observations.iter().enumerate() {
        match parse_observation(raw)? {
            Some(record) => records.push(record),
            None => {
                warn!("Skipping observation {}: missing id, name, type or startTime", index);
                skipped += 1;
            }
        }
    }

    Ok(ParsedTrace {
        trace_id,
        project,
        format: TraceFormat::Observations,
        records,
        skipped,
    })
}

/// Parse one observation
///
/// **Public** - the per-record builder for observations
///
/// # Returns
/// * `Ok(None)` - `id`, `name`, `type` or `startTime` is missing; the observation is skipped
/// * `Ok(Some(record))` - a canonical record with empty `order_path`
///
/// # Errors
/// * `ParseError::InvalidTimestamp` - `startTime` or `endTime` is malformed
pub fn parse_observation(raw: &Value) -> Result<Option<CanonicalRunRecord>, ParseError> {
    let (Some(id), Some(name), Some(obs_type)) = (
        str_field(raw, "id"),
        str_field(raw, "name"),
        str_field(raw, "type"),
    ) else {
        return Ok(None);
    };

    let start_time = match raw.get("startTime") {
        None | Some(Value::Null) => {
            debug!("Observation {} has no startTime", id);
            return Ok(None);
        }
        Some(value) => timestamp_field(value)?,
    };

    let end_time = match raw.get("endTime") {
        None | Some(Value::Null) => None,
        Some(value) => Some(timestamp_field(value)?),
    };

    let mut record = CanonicalRunRecord::new(id, name, classify_observation(obs_type), start_time);
    record.end_time = end_time;
    record.parent_id = str_field(raw, "parentObservationId")
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    record.inputs = raw.get("input").and_then(payload_map);
    record.outputs = raw.get("output").and_then(payload_map);
    record.error = observation_error(raw);
    record.metadata = observation_metadata(raw);

    Ok(Some(record))
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

fn timestamp_field(value: &Value) -> Result<Timestamp, ParseError> {
    match value.as_str() {
        Some(s) => parse_iso_timestamp(s),
        None => Err(ParseError::timestamp(value, "expected an ISO-8601 string")),
    }
}

/// Objects pass through; any other non-null payload is wrapped
fn payload_map(payload: &Value) -> Option<AttributeMap> {
    match payload {
        Value::Null => None,
        Value::Object(map) => Some(map.clone()),
        other => {
            let mut wrapped = AttributeMap::new();
            wrapped.insert(PAYLOAD_VALUE_KEY.to_string(), other.clone());
            Some(wrapped)
        }
    }
}

fn observation_error(raw: &Value) -> Option<String> {
    let level = str_field(raw, "level")?;
    if !level.eq_ignore_ascii_case(OBSERVATION_ERROR_LEVEL) {
        return None;
    }

    let message = str_field(raw, "statusMessage")
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_ERROR);
    Some(message.to_string())
}

fn observation_metadata(raw: &Value) -> AttributeMap {
    OBSERVATION_METADATA_FIELDS
        .iter()
        .filter_map(|field| {
            raw.get(*field)
                .filter(|v| !v.is_null())
                .map(|v| (field.to_string(), v.clone()))
        })
        .collect()
}
