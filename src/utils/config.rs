//! Configuration and constants for trace normalization.

/// Top-level key marking a vendor observation export
pub const OBSERVATIONS_KEY: &str = "observations";

/// Top-level key marking an OTLP/JSON span export
pub const RESOURCE_SPANS_KEY: &str = "resourceSpans";

/// Project/service name used when a document does not carry one
pub const UNKNOWN_PROJECT: &str = "unknown";

/// Error message used when a failure is flagged without any text
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Width of one zero-padded order path segment ("0000")
pub const ORDER_SEGMENT_WIDTH: usize = 4;

/// Separator between order path segments
pub const ORDER_SEPARATOR: char = '.';

// Attribute prefixes that mark a span as a generative-model call
pub const GENAI_PREFIXES: &[&str] = &["gen_ai."];

// Conventional OTLP keys
pub const SERVICE_NAME_KEY: &str = "service.name";
pub const EXCEPTION_EVENT_NAME: &str = "exception";
pub const EXCEPTION_MESSAGE_KEY: &str = "exception.message";

// Structured GenAI message payloads, with the deprecated per-index fallbacks
pub const GENAI_INPUT_MESSAGES: &str = "gen_ai.input.messages";
pub const GENAI_OUTPUT_MESSAGES: &str = "gen_ai.output.messages";
pub const GENAI_PROMPT_PREFIX: &str = "gen_ai.prompt.";
pub const GENAI_COMPLETION_PREFIX: &str = "gen_ai.completion.";

// Status code spellings meaning "error" (OTLP/JSON enum name or integer)
pub const STATUS_ERROR_NAME: &str = "STATUS_CODE_ERROR";
pub const STATUS_ERROR_CODE: i64 = 2;

// Span kind spellings meaning "client"
pub const SPAN_KIND_CLIENT_NAME: &str = "SPAN_KIND_CLIENT";
pub const SPAN_KIND_CLIENT_CODE: i64 = 3;

/// Observation level flagging a failed unit
pub const OBSERVATION_ERROR_LEVEL: &str = "ERROR";

/// Observation fields preserved verbatim in record metadata
pub const OBSERVATION_METADATA_FIELDS: &[&str] =
    &["type", "level", "statusMessage", "model", "usage", "metadata"];
