//! Parser for OTLP/JSON span exports.
//!
//! Document shape:
//! `{ resourceSpans: [{ resource: { attributes }, scopeSpans: [{ scope?, spans: [...] }] }] }`
//!
//! Validation is all-or-nothing: one span missing a mandatory field fails
//! the whole document. There is no per-span skip path.

use super::attributes::{flatten_attributes, nest_prefixed};
use super::classify::classify_span;
use super::detect::TraceFormat;
use super::timestamp::parse_unix_nanos;
use super::ParsedTrace;
use crate::model::{AttributeMap, CanonicalRunRecord};
use crate::utils::config::{
    EXCEPTION_EVENT_NAME, EXCEPTION_MESSAGE_KEY, GENAI_COMPLETION_PREFIX, GENAI_INPUT_MESSAGES,
    GENAI_OUTPUT_MESSAGES, GENAI_PROMPT_PREFIX, SERVICE_NAME_KEY, STATUS_ERROR_CODE,
    STATUS_ERROR_NAME, UNKNOWN_ERROR, UNKNOWN_PROJECT,
};
use crate::utils::error::ParseError;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

// Metadata keys added next to the flattened span attributes
pub const META_TRACE_ID: &str = "otel.trace_id";
pub const META_SPAN_KIND: &str = "otel.span_kind";
pub const META_STATUS_CODE: &str = "otel.status_code";
pub const META_STATUS_MESSAGE: &str = "otel.status_message";
pub const META_SCOPE_NAME: &str = "otel.scope_name";

/// Key holding a decoded structured message payload in inputs/outputs
const MESSAGES_KEY: &str = "messages";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope {
    #[serde(default)]
    resource_spans: Option<Vec<ResourceSpans>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSpans {
    #[serde(default)]
    resource: Option<Resource>,
    #[serde(default)]
    scope_spans: Option<Vec<ScopeSpans>>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(default)]
    attributes: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScopeSpans {
    #[serde(default)]
    scope: Option<Scope>,
    #[serde(default)]
    spans: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Scope {
    #[serde(default)]
    name: Option<String>,
}

/// Where a span sits in the document, for metadata and error messages
struct SpanContext<'a> {
    service_name: Option<&'a str>,
    scope_name: Option<&'a str>,
    location: String,
}

/// Parse a whole OTLP/JSON export
///
/// **Public** - dispatched to by `parse_document`
///
/// # Arguments
/// * `document` - Decoded top-level JSON object
/// * `trace_id` - Caller-supplied trace id; when `None` the first span's `traceId` is used
///
/// # Errors
/// * `ParseError::InvalidFormat` - the resource/scope envelope has the wrong shape
/// * `ParseError::MissingField` - a span lacks a mandatory field
/// * `ParseError::InvalidTimestamp` - a span timestamp is not numeric nanoseconds
pub fn parse_otlp_export(
    document: &Value,
    trace_id: Option<&str>,
) -> Result<ParsedTrace, ParseError> {
    let envelope = ExportEnvelope::deserialize(document)
        .map_err(|e| ParseError::InvalidFormat(format!("malformed OTLP envelope: {}", e)))?;
    let resource_spans = envelope.resource_spans.unwrap_or_default();

    // Service name comes from the first resource only
    let service_name = resource_spans
        .first()
        .and_then(|rs| rs.resource.as_ref())
        .map(|resource| flatten_attributes(resource.attributes.as_ref()))
        .and_then(|attrs| match attrs.get(SERVICE_NAME_KEY) {
            Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
            _ => None,
        });

    let mut records = Vec::new();

    for (rs_index, rs) in resource_spans.iter().enumerate() {
        for (ss_index, ss) in rs.scope_spans.iter().flatten().enumerate() {
            let scope_name = ss.scope.as_ref().and_then(|s| s.name.as_deref());

            for (span_index, span) in ss.spans.iter().flatten().enumerate() {
                let ctx = SpanContext {
                    service_name: service_name.as_deref(),
                    scope_name,
                    location: format!(
                        "resourceSpans[{}].scopeSpans[{}].spans[{}]",
                        rs_index, ss_index, span_index
                    ),
                };
                records.push(parse_span_in(span, &ctx)?);
            }
        }
    }

    debug!(
        "Parsed {} spans from {} resource blocks",
        records.len(),
        resource_spans.len()
    );

    let trace_id = match trace_id {
        Some(id) => id.to_string(),
        None => records
            .first()
            .and_then(|r| r.metadata.get(META_TRACE_ID))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    Ok(ParsedTrace {
        trace_id,
        project: service_name.unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
        format: TraceFormat::Otlp,
        records,
        skipped: 0,
    })
}

/// Parse one span into a canonical record
///
/// **Public** - the per-record builder for spans
///
/// # Errors
/// * `ParseError::MissingField` - `traceId`, `spanId`, `name`, `startTimeUnixNano`
///   or `endTimeUnixNano` is absent
/// * `ParseError::InvalidTimestamp` - a timestamp is not numeric nanoseconds
pub fn parse_span(span: &Value, service_name: Option<&str>) -> Result<CanonicalRunRecord, ParseError> {
    let ctx = SpanContext {
        service_name,
        scope_name: None,
        location: "span".to_string(),
    };
    parse_span_in(span, &ctx)
}

fn parse_span_in(span: &Value, ctx: &SpanContext<'_>) -> Result<CanonicalRunRecord, ParseError> {
    let trace_id = required_id(span, "traceId", ctx)?;
    let span_id = required_id(span, "spanId", ctx)?;
    let name = span
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::missing("name", ctx.location.clone()))?;

    let start_time = parse_unix_nanos(required(span, "startTimeUnixNano", ctx)?)?;
    let end_time = parse_unix_nanos(required(span, "endTimeUnixNano", ctx)?)?;

    let attributes = flatten_attributes(span.get("attributes"));
    let kind = classify_span(&attributes, span.get("kind"));

    let mut record = CanonicalRunRecord::new(span_id, name, kind, start_time).with_end_time(end_time);
    record.parent_id = span
        .get("parentSpanId")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    record.error = extract_error(span);
    record.inputs = extract_messages(&attributes, GENAI_INPUT_MESSAGES, GENAI_PROMPT_PREFIX);
    record.outputs = extract_messages(&attributes, GENAI_OUTPUT_MESSAGES, GENAI_COMPLETION_PREFIX);
    record.metadata = span_metadata(span, attributes, trace_id, ctx);

    Ok(record)
}

fn required<'a>(
    span: &'a Value,
    field: &'static str,
    ctx: &SpanContext<'_>,
) -> Result<&'a Value, ParseError> {
    match span.get(field) {
        None | Some(Value::Null) => Err(ParseError::missing(field, ctx.location.clone())),
        Some(value) => Ok(value),
    }
}

fn required_id<'a>(
    span: &'a Value,
    field: &'static str,
    ctx: &SpanContext<'_>,
) -> Result<&'a str, ParseError> {
    span.get(field)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ParseError::missing(field, ctx.location.clone()))
}

/// Error message by strict priority: exception event, then error status
///
/// **Public** - exposed for reuse by span consumers
pub fn extract_error(span: &Value) -> Option<String> {
    let exception = span
        .get("events")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|event| event.get("name").and_then(Value::as_str) == Some(EXCEPTION_EVENT_NAME))
        .find_map(|event| {
            let attrs = flatten_attributes(event.get("attributes"));
            attrs.get(EXCEPTION_MESSAGE_KEY).and_then(value_text)
        });
    if exception.is_some() {
        return exception;
    }

    let status = span.get("status")?;
    if !status.get("code").is_some_and(is_error_code) {
        return None;
    }

    let message = status
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_ERROR);
    Some(message.to_string())
}

fn is_error_code(code: &Value) -> bool {
    match code {
        Value::String(s) => s == STATUS_ERROR_NAME || s.parse::<i64>() == Ok(STATUS_ERROR_CODE),
        Value::Number(n) => n.as_i64() == Some(STATUS_ERROR_CODE),
        _ => false,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Structured payload attribute first, deprecated per-index family second
fn extract_messages(
    attributes: &AttributeMap,
    payload_key: &str,
    legacy_prefix: &str,
) -> Option<AttributeMap> {
    if let Some(payload) = attributes.get(payload_key).filter(|v| !v.is_null()) {
        let decoded = match payload {
            Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| payload.clone()),
            other => other.clone(),
        };
        let mut messages = AttributeMap::new();
        messages.insert(MESSAGES_KEY.to_string(), decoded);
        return Some(messages);
    }

    nest_prefixed(attributes, legacy_prefix)
}

fn span_metadata(
    span: &Value,
    mut metadata: AttributeMap,
    trace_id: &str,
    ctx: &SpanContext<'_>,
) -> AttributeMap {
    metadata.insert(META_TRACE_ID.to_string(), Value::from(trace_id));

    if let Some(kind) = span.get("kind").filter(|k| !k.is_null()) {
        metadata.insert(META_SPAN_KIND.to_string(), kind.clone());
    }
    if let Some(status) = span.get("status") {
        if let Some(code) = status.get("code").filter(|c| !c.is_null()) {
            metadata.insert(META_STATUS_CODE.to_string(), code.clone());
        }
        if let Some(message) = status.get("message").filter(|m| !m.is_null()) {
            metadata.insert(META_STATUS_MESSAGE.to_string(), message.clone());
        }
    }
    if let Some(service) = ctx.service_name {
        metadata
            .entry(SERVICE_NAME_KEY.to_string())
            .or_insert_with(|| Value::from(service));
    }
    if let Some(scope) = ctx.scope_name {
        metadata.insert(META_SCOPE_NAME.to_string(), Value::from(scope));
    }

    metadata
}
