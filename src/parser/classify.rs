//! Operation-kind classification.
//!
//! Each wire format has its own vocabulary for "what kind of work was
//! this". Both are mapped onto the canonical `RunKind`.

use crate::model::{AttributeMap, RunKind};
use crate::utils::config::{GENAI_PREFIXES, SPAN_KIND_CLIENT_CODE, SPAN_KIND_CLIENT_NAME};
use serde_json::Value;

/// Observation type tokens, matched case-insensitively
const OBSERVATION_KINDS: &[(&str, RunKind)] = &[
    ("GENERATION", RunKind::LlmCall),
    ("SPAN", RunKind::Chain),
    ("EVENT", RunKind::Chain),
    ("AGENT", RunKind::Chain),
    ("CHAIN", RunKind::Chain),
    ("TOOL", RunKind::ToolCall),
    ("RETRIEVER", RunKind::Retriever),
    ("EMBEDDING", RunKind::Embedding),
    ("PROMPT", RunKind::PromptRender),
    ("PARSER", RunKind::Parser),
];

/// Map an observation type to a run kind; unknown tokens are `Chain`
pub fn classify_observation(token: &str) -> RunKind {
    let token = token.trim();
    OBSERVATION_KINDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

/// Classify an OTLP span
///
/// GenAI attributes win regardless of the declared span kind, then a
/// client span is a tool call, everything else is a chain.
pub fn classify_span(attributes: &AttributeMap, span_kind: Option<&Value>) -> RunKind {
    if has_genai_attributes(attributes) {
        RunKind::LlmCall
    } else if span_kind.is_some_and(is_client_kind) {
        RunKind::ToolCall
    } else {
        RunKind::Chain
    }
}

pub fn has_genai_attributes(attributes: &AttributeMap) -> bool {
    attributes
        .keys()
        .any(|key| GENAI_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
}

/// Span kind may be the enum name or its integer value
pub fn is_client_kind(kind: &Value) -> bool {
    match kind {
        Value::String(s) => s == SPAN_KIND_CLIENT_NAME,
        Value::Number(n) => n.as_i64() == Some(SPAN_KIND_CLIENT_CODE),
        _ => false,
    }
}
