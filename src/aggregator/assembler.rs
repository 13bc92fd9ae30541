//! Assemble parsed records into one canonical trace.
//!
//! The two formats keep distinct empty-trace policies:
//! - observations: zero records is fine, bounds fall back to "now"
//! - OTLP: zero spans is a hard `ParseError::NoSpans`

use super::hierarchy::build_hierarchy;
use crate::model::{CanonicalRunRecord, CanonicalTrace, Timestamp};
use crate::parser::{ParsedTrace, TraceFormat};
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::collections::HashSet;

/// Build the canonical trace from parser output
///
/// **Public** - final stage of `parse_document`
///
/// # Algorithm
/// 1. Apply the format's empty-trace policy
/// 2. Drop records whose id was already seen
/// 3. Repair the parent graph and assign order paths
/// 4. Compute bounds: earliest start, latest end
///
/// # Errors
/// * `ParseError::NoSpans` - an OTLP document produced no spans
pub fn assemble_trace(parsed: ParsedTrace) -> Result<CanonicalTrace, ParseError> {
    let ParsedTrace {
        trace_id,
        project,
        format,
        records,
        skipped,
    } = parsed;

    if records.is_empty() && format == TraceFormat::Otlp {
        return Err(ParseError::NoSpans);
    }

    let (mut records, duplicates) = dedup_by_id(records);

    let mut repairs = build_hierarchy(&mut records);
    repairs.skipped = skipped;
    repairs.duplicates = duplicates;

    let bounds = trace_bounds(&records);

    debug!(
        "Assembled trace {} ({}): {} records",
        trace_id,
        format.as_str(),
        records.len()
    );

    Ok(CanonicalTrace::new(
        trace_id, project, format, bounds, records, repairs,
    ))
}

/// Keep the first record for each id
fn dedup_by_id(records: Vec<CanonicalRunRecord>) -> (Vec<CanonicalRunRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let mut unique = Vec::with_capacity(total);

    for record in records {
        if seen.contains(&record.id) {
            warn!("Dropping duplicate record id {}", record.id);
            continue;
        }
        seen.insert(record.id.clone());
        unique.push(record);
    }

    let dropped = total - unique.len();
    (unique, dropped)
}

/// Earliest start and latest end
///
/// With no records both bounds are the current time. When no record has
/// an end time, the latest start is used as the end.
pub fn trace_bounds(records: &[CanonicalRunRecord]) -> (Timestamp, Timestamp) {
    let Some(start) = records.iter().map(|r| r.start_time).min() else {
        let now = Timestamp::now();
        return (now, now);
    };

    let end = records
        .iter()
        .filter_map(|r| r.end_time)
        .max()
        .or_else(|| records.iter().map(|r| r.start_time).max())
        .unwrap_or(start);

    (start, end)
}
