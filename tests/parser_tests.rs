use pretty_assertions::assert_eq;
use serde_json::json;
use trace_canon::parser::{parse_iso_timestamp, parse_unix_nanos};
use trace_canon::{parse_bytes, parse_document, ParseError, RunKind, TraceFormat};

const OBSERVATIONS: &str = include_str!("fixtures/observations.json");
const OTLP: &str = include_str!("fixtures/otlp.json");

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn order(trace: &trace_canon::CanonicalTrace) -> Vec<(&str, &str)> {
    trace
        .records()
        .iter()
        .map(|r| (r.order_path.as_str(), r.id.as_str()))
        .collect()
}

#[test]
fn test_observation_fixture() {
    init_logger();
    let trace = parse_bytes(OBSERVATIONS.as_bytes(), None).unwrap();

    assert_eq!(trace.format(), TraceFormat::Observations);
    assert_eq!(trace.trace_id(), "trace-001");
    assert_eq!(trace.project(), "demo-project");
    assert_eq!(
        order(&trace),
        vec![
            ("0000", "obs-root"),
            ("0000.0000", "obs-tool"),
            ("0000.0001", "obs-gen"),
            ("0001", "obs-orphan"),
        ]
    );

    let repairs = trace.repairs();
    assert_eq!(repairs.skipped, 1);
    assert_eq!(repairs.dangling, 1);

    let generation = trace.get("obs-gen").unwrap();
    assert_eq!(generation.kind, RunKind::LlmCall);
    assert_eq!(generation.error.as_deref(), Some("rate limited"));
    assert!(generation.outputs.is_none());

    assert_eq!(trace.start_time().to_iso(), "2025-01-15T10:00:00Z");
    assert_eq!(trace.end_time().to_iso(), "2025-01-15T10:00:05Z");
}

#[test]
fn test_otlp_fixture() {
    init_logger();
    let trace = parse_bytes(OTLP.as_bytes(), None).unwrap();

    assert_eq!(trace.format(), TraceFormat::Otlp);
    assert_eq!(trace.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(trace.project(), "checkout");
    assert_eq!(
        order(&trace),
        vec![
            ("0000", "span-root"),
            ("0000.0000", "span-http"),
            ("0000.0001", "span-llm"),
            ("0001", "span-self"),
        ]
    );
    assert_eq!(trace.repairs().self_references, 1);

    let llm = trace.get("span-llm").unwrap();
    assert_eq!(llm.kind, RunKind::LlmCall);
    assert_eq!(llm.error.as_deref(), Some("model overloaded"));
    assert_eq!(llm.metadata["gen_ai.usage.input_tokens"], json!(42));
    assert_eq!(
        llm.inputs.as_ref().unwrap()["messages"],
        json!([{"role": "user", "content": "hi"}])
    );

    let http = trace.get("span-http").unwrap();
    assert_eq!(http.kind, RunKind::ToolCall);
    assert_eq!(http.error.as_deref(), Some("connection reset"));

    assert_eq!(trace.get("span-root").unwrap().kind, RunKind::Chain);
    assert!(trace.get("span-root").unwrap().is_root());
}

#[test]
fn test_observations_m_of_n_parsed() {
    let mut observations = Vec::new();
    for i in 0..10 {
        let mut obs = json!({
            "id": format!("o{}", i),
            "name": "step",
            "type": "SPAN",
            "startTime": format!("2024-05-01T00:00:{:02}Z", i)
        });
        // every third observation loses its type
        if i % 3 == 0 {
            obs.as_object_mut().unwrap().remove("type");
        }
        observations.push(obs);
    }

    let trace = parse_document(&json!({"id": "t", "observations": observations}), None).unwrap();
    assert_eq!(trace.len(), 6);
    assert_eq!(trace.repairs().skipped, 4);
}

#[test]
fn test_single_observation() {
    let doc = json!({
        "id": "t1",
        "observations": [
            {"id": "a", "name": "root", "type": "SPAN", "startTime": "2025-01-15T10:00:00Z"}
        ]
    });

    let trace = parse_document(&doc, None).unwrap();
    assert_eq!(trace.len(), 1);

    let record = &trace.records()[0];
    assert_eq!(record.order_path, "0000");
    assert!(record.parent_id.is_none());
    assert_eq!(record.kind, RunKind::Chain);
    assert_eq!(trace.project(), "unknown");
    assert_eq!(trace.start_time(), trace.end_time());
}

#[test]
fn test_unrecognized_document() {
    assert!(matches!(
        parse_document(&json!({"data": []}), None),
        Err(ParseError::FormatUnrecognized)
    ));
}

#[test]
fn test_otlp_without_spans() {
    let err = parse_document(&json!({"resourceSpans": []}), None).unwrap_err();
    assert!(matches!(err, ParseError::NoSpans));
    assert_eq!(err.to_string(), "no spans found");

    let empty_scopes = json!({"resourceSpans": [{"scopeSpans": [{"spans": []}]}]});
    assert!(matches!(
        parse_document(&empty_scopes, None),
        Err(ParseError::NoSpans)
    ));
}

#[test]
fn test_both_markers_parse_as_observations() {
    let doc = json!({
        "id": "t1",
        "observations": [],
        "resourceSpans": [{"scopeSpans": [{"spans": []}]}]
    });

    let trace = parse_document(&doc, None).unwrap();
    assert_eq!(trace.format(), TraceFormat::Observations);
    assert!(trace.is_empty());
}

#[test]
fn test_otlp_caller_trace_id() {
    let trace = parse_bytes(OTLP.as_bytes(), Some("from-caller")).unwrap();
    assert_eq!(trace.trace_id(), "from-caller");
}

#[test]
fn test_malformed_observation_timestamp_fails() {
    let doc = json!({
        "id": "t1",
        "observations": [
            {"id": "a", "name": "root", "type": "SPAN", "startTime": "last tuesday"}
        ]
    });
    assert!(matches!(
        parse_document(&doc, None),
        Err(ParseError::InvalidTimestamp { .. })
    ));
}

#[test]
fn test_timestamp_examples() {
    let nanos = parse_unix_nanos(&json!("1609459200000000000")).unwrap();
    assert_eq!(nanos.to_iso(), "2021-01-01T00:00:00Z");

    let iso = parse_iso_timestamp("2025-01-15T10:00:00Z").unwrap();
    assert_eq!(iso.instant().timestamp(), 1_736_935_200);
}

#[test]
fn test_invalid_json_bytes() {
    assert!(matches!(
        parse_bytes(b"[1, 2,", None),
        Err(ParseError::Decode(_))
    ));
}

#[test]
fn test_trace_serializes() {
    let trace = parse_bytes(OBSERVATIONS.as_bytes(), None).unwrap();
    let value = serde_json::to_value(&trace).unwrap();

    assert_eq!(value["trace_id"], json!("trace-001"));
    assert_eq!(value["format"], json!("observations"));
    assert_eq!(value["records"][0]["kind"], json!("chain"));
    assert_eq!(value["records"][0]["start_time"], json!("2025-01-15T10:00:00Z"));
    assert!(value.get("index").is_none());
}

#[test]
fn test_observation_without_start_time_is_skipped() {
    init_logger();
    let doc = json!({
        "id": "t",
        "observations": [
            {"id": "a", "name": "full", "type": "SPAN", "startTime": "2025-01-15T10:00:00Z"},
            {"id": "b", "name": "no start", "type": "SPAN"},
            {"id": "c", "name": "null start", "type": "TOOL", "startTime": null, "parentObservationId": "a"},
            {"id": "d", "name": "child", "type": "TOOL", "startTime": "2025-01-15T10:00:01Z", "parentObservationId": "a"}
        ]
    });

    let trace = parse_document(&doc, None).unwrap();
    assert_eq!(order(&trace), vec![("0000", "a"), ("0000.0000", "d")]);
    assert_eq!(trace.repairs().skipped, 2);
}

#[test]
fn test_skips_and_duplicates_both_reduce_record_count() {
    let doc = json!({
        "id": "t",
        "observations": [
            {"id": "a", "name": "first", "type": "SPAN", "startTime": "2025-01-15T10:00:00Z"},
            {"id": "a", "name": "second", "type": "SPAN", "startTime": "2025-01-15T10:00:01Z"},
            {"id": "b", "type": "SPAN", "startTime": "2025-01-15T10:00:02Z"},
            {"id": "b", "name": "kept", "type": "SPAN", "startTime": "2025-01-15T10:00:03Z"},
            {"id": "c", "name": "no start", "type": "SPAN"}
        ]
    });

    let trace = parse_document(&doc, None).unwrap();

    // five raw units: two skipped, one duplicate dropped
    assert_eq!(trace.len(), 2);
    assert_eq!(trace.repairs().skipped, 2);
    assert_eq!(trace.repairs().duplicates, 1);
    assert_eq!(trace.get("a").unwrap().name, "first");
    // a skipped unit never claims its id
    assert_eq!(trace.get("b").unwrap().name, "kept");
}
