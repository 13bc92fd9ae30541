//! Canonical trace aggregate.
//!
//! Built once by the assembler after the hierarchy pass, then read-only.
//! Records are kept sorted by `order_path`, which reproduces the
//! time-ordered depth-first enumeration of the run tree.

use super::run::CanonicalRunRecord;
use super::timestamp::Timestamp;
use crate::aggregator::hierarchy::RepairReport;
use crate::parser::detect::TraceFormat;
use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;

/// The full set of runs from one execution plus summary bounds
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalTrace {
    trace_id: String,
    project: String,
    format: TraceFormat,
    start_time: Timestamp,
    end_time: Timestamp,
    records: Vec<CanonicalRunRecord>,
    repairs: RepairReport,

    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CanonicalTrace {
    /// `records` must already carry repaired parents and order paths
    pub(crate) fn new(
        trace_id: String,
        project: String,
        format: TraceFormat,
        bounds: (Timestamp, Timestamp),
        mut records: Vec<CanonicalRunRecord>,
        repairs: RepairReport,
    ) -> Self {
        records.sort_by(|a, b| a.order_path.cmp(&b.order_path));
        let index = records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id.clone(), pos))
            .collect();

        Self {
            trace_id,
            project,
            format,
            start_time: bounds.0,
            end_time: bounds.1,
            records,
            repairs,
            index,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Project id (observation exports) or service name (OTLP), `"unknown"` when absent
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn format(&self) -> TraceFormat {
        self.format
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time.duration_since(&self.start_time)
    }

    /// All records in `order_path` order
    pub fn records(&self) -> &[CanonicalRunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Anomalies repaired while building the hierarchy
    pub fn repairs(&self) -> &RepairReport {
        &self.repairs
    }

    pub fn get(&self, id: &str) -> Option<&CanonicalRunRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn roots(&self) -> impl Iterator<Item = &CanonicalRunRecord> {
        self.records.iter().filter(|r| r.is_root())
    }

    /// Direct children of `id`, in start-time order
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a CanonicalRunRecord> {
        self.records
            .iter()
            .filter(move |r| r.parent_id.as_deref() == Some(id))
    }

    pub fn into_records(self) -> Vec<CanonicalRunRecord> {
        self.records
    }
}
