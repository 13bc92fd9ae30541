//! Canonical run record: one unit of execution, independent of wire format.

use super::timestamp::Timestamp;
use crate::utils::config::ORDER_SEPARATOR;
use chrono::Duration;
use serde::Serialize;

/// Flat string-keyed map of JSON values
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// Canonical kind of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    LlmCall,
    #[default]
    Chain,
    ToolCall,
    Retriever,
    Embedding,
    PromptRender,
    Parser,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmCall => "llm_call",
            Self::Chain => "chain",
            Self::ToolCall => "tool_call",
            Self::Retriever => "retriever",
            Self::Embedding => "embedding",
            Self::PromptRender => "prompt_render",
            Self::Parser => "parser",
        }
    }
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized unit of execution
///
/// Created once by a format parser. `parent_id` and `order_path` are
/// rewritten by the hierarchy pass and left alone afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRunRecord {
    /// Unique within a trace
    pub id: String,

    /// Human-readable label
    pub name: String,

    pub kind: RunKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<AttributeMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<AttributeMap>,

    pub start_time: Timestamp,

    pub end_time: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Id of the parent record in the same trace (lookup only, never ownership)
    pub parent_id: Option<String>,

    /// Zero-padded dotted position, e.g. "0000.0003"; empty until the hierarchy pass
    pub order_path: String,

    /// Format-specific fields preserved verbatim
    pub metadata: AttributeMap,
}

impl CanonicalRunRecord {
    /// Create a record with the mandatory fields, everything else empty
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: RunKind,
        start_time: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            inputs: None,
            outputs: None,
            start_time,
            end_time: None,
            error: None,
            parent_id: None,
            order_path: String::new(),
            metadata: AttributeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_end_time(mut self, end_time: Timestamp) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Nesting depth derived from the order path (roots are 0)
    pub fn depth(&self) -> Option<usize> {
        if self.order_path.is_empty() {
            None
        } else {
            Some(self.order_path.matches(ORDER_SEPARATOR).count())
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_time
            .map(|end| end.duration_since(&self.start_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_utc(Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_depth_from_order_path() {
        let mut record = CanonicalRunRecord::new("a", "root", RunKind::Chain, at(0));
        assert_eq!(record.depth(), None);

        record.order_path = "0000".to_string();
        assert_eq!(record.depth(), Some(0));

        record.order_path = "0000.0002.0001".to_string();
        assert_eq!(record.depth(), Some(2));
    }

    #[test]
    fn test_duration() {
        let record = CanonicalRunRecord::new("a", "n", RunKind::ToolCall, at(10)).with_end_time(at(13));
        assert_eq!(record.duration(), Some(Duration::seconds(3)));
        assert!(record.is_root());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_value(RunKind::LlmCall).unwrap();
        assert_eq!(json, serde_json::json!("llm_call"));
    }
}
