//! Parent graph repair and order path assignment.
//!
//! Parent links arrive straight from the raw export and cannot be trusted.
//! This pass makes them safe to walk, then numbers every record:
//!
//! 1. Index records by id (first occurrence wins)
//! 2. Promote every member of a parent cycle to a root
//! 3. Promote records whose parent id is not in the trace
//! 4. Promote records that name themselves as parent
//! 5. Build parent -> children adjacency
//! 6. Assign order paths depth-first, siblings by ascending start time
//!
//! Example: a root with two children gets "0000", "0000.0000", "0000.0001".
//! String order of the paths reproduces the time-ordered depth-first walk.
//!
//! Nothing here fails. Every anomaly is repaired, logged and counted.
//! Both walks use explicit stacks, so degenerate chains of any depth are safe.

use crate::model::CanonicalRunRecord;
use crate::utils::config::{ORDER_SEGMENT_WIDTH, ORDER_SEPARATOR};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Counts of anomalies repaired while building a trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Raw units dropped by per-record validation
    pub skipped: usize,

    /// Records dropped because an earlier record had the same id
    pub duplicates: usize,

    /// Records promoted to root because they sat on a parent cycle
    pub cycles: usize,

    /// Records promoted to root because their parent is not in the trace
    pub dangling: usize,

    /// Records promoted to root because they named themselves as parent
    pub self_references: usize,

    /// Sibling groups too large for the default segment width
    pub widened_groups: usize,
}

impl RepairReport {
    /// Parent links rewritten by the hierarchy pass
    pub fn parents_repaired(&self) -> usize {
        self.cycles + self.dangling + self.self_references
    }

    /// True when the raw input needed no repair at all
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.duplicates == 0 && self.parents_repaired() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    InProgress,
    Done,
}

/// Repair parent links and assign order paths in place
///
/// **Public** - main entry point for hierarchy building
///
/// # Arguments
/// * `records` - All records of one trace, in input order
///
/// # Returns
/// Counts of the parent repairs performed; `skipped` and `duplicates`
/// are left at zero for the caller to fill in
///
/// Running this twice on the same records is a no-op the second time.
pub fn build_hierarchy(records: &mut [CanonicalRunRecord]) -> RepairReport {
    let mut report = RepairReport::default();

    let index = index_by_id(records);
    repair_cycles(records, &index, &mut report);
    repair_dangling(records, &index, &mut report);
    repair_self_references(records, &mut report);

    let (roots, children) = adjacency(records, &index);
    assign_order_paths(records, roots, children, &mut report);

    debug!(
        "Hierarchy built for {} records: {} parent links repaired",
        records.len(),
        report.parents_repaired()
    );

    report
}

fn index_by_id(records: &[CanonicalRunRecord]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(records.len());
    for (pos, record) in records.iter().enumerate() {
        if index.contains_key(&record.id) {
            warn!("Duplicate record id {}; parent lookups use the first", record.id);
            continue;
        }
        index.insert(record.id.clone(), pos);
    }
    index
}

/// Parent position, excluding dangling and self links (handled separately)
fn parent_position(
    records: &[CanonicalRunRecord],
    index: &HashMap<String, usize>,
    pos: usize,
) -> Option<usize> {
    let parent = records[pos].parent_id.as_ref()?;
    index.get(parent).copied().filter(|&p| p != pos)
}

fn repair_cycles(
    records: &mut [CanonicalRunRecord],
    index: &HashMap<String, usize>,
    report: &mut RepairReport,
) {
    let n = records.len();
    let mut state = vec![Visit::New; n];
    // position of each record on the walk that first reached it
    let mut walk_pos = vec![0usize; n];
    let mut members = Vec::new();
    let mut walk = Vec::new();

    for start in 0..n {
        if state[start] != Visit::New {
            continue;
        }

        walk.clear();
        let mut current = Some(start);

        while let Some(pos) = current {
            match state[pos] {
                Visit::Done => break,
                Visit::InProgress => {
                    // the walk came back to itself: everything from `pos` on is the cycle
                    members.extend_from_slice(&walk[walk_pos[pos]..]);
                    break;
                }
                Visit::New => {
                    state[pos] = Visit::InProgress;
                    walk_pos[pos] = walk.len();
                    walk.push(pos);
                    current = parent_position(records, index, pos);
                }
            }
        }

        for &pos in &walk {
            state[pos] = Visit::Done;
        }
    }

    for pos in members {
        let record = &mut records[pos];
        warn!(
            "Record {} is on a parent cycle (parent {}); promoting to root",
            record.id,
            record.parent_id.as_deref().unwrap_or_default()
        );
        record.parent_id = None;
        report.cycles += 1;
    }
}

fn repair_dangling(
    records: &mut [CanonicalRunRecord],
    index: &HashMap<String, usize>,
    report: &mut RepairReport,
) {
    for record in records.iter_mut() {
        let Some(parent) = record.parent_id.as_deref() else {
            continue;
        };
        if index.contains_key(parent) {
            continue;
        }
        warn!(
            "Record {} references missing parent {}; promoting to root",
            record.id, parent
        );
        record.parent_id = None;
        report.dangling += 1;
    }
}

fn repair_self_references(records: &mut [CanonicalRunRecord], report: &mut RepairReport) {
    for record in records.iter_mut() {
        if record.parent_id.as_deref() != Some(record.id.as_str()) {
            continue;
        }
        warn!("Record {} is its own parent; promoting to root", record.id);
        record.parent_id = None;
        report.self_references += 1;
    }
}

/// Roots and children lists, each still in input order
fn adjacency(
    records: &[CanonicalRunRecord],
    index: &HashMap<String, usize>,
) -> (Vec<usize>, Vec<Vec<usize>>) {
    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); records.len()];

    for (pos, record) in records.iter().enumerate() {
        match record.parent_id.as_ref().and_then(|p| index.get(p)) {
            Some(&parent) => children[parent].push(pos),
            None => roots.push(pos),
        }
    }

    (roots, children)
}

fn assign_order_paths(
    records: &mut [CanonicalRunRecord],
    roots: Vec<usize>,
    mut children: Vec<Vec<usize>>,
    report: &mut RepairReport,
) {
    // (record position, order path) pairs still to be written
    let mut stack: Vec<(usize, String)> = Vec::with_capacity(records.len());

    push_siblings(records, roots, "", &mut stack, report);

    while let Some((pos, path)) = stack.pop() {
        let kids = std::mem::take(&mut children[pos]);
        push_siblings(records, kids, &path, &mut stack, report);
        records[pos].order_path = path;
    }
}

/// Sort one sibling group by start time and queue each with its path
fn push_siblings(
    records: &[CanonicalRunRecord],
    mut group: Vec<usize>,
    prefix: &str,
    stack: &mut Vec<(usize, String)>,
    report: &mut RepairReport,
) {
    if group.is_empty() {
        return;
    }

    // stable on the instant alone: equal start times keep input order,
    // even when one is naive and the other carries an offset
    group.sort_by_key(|&pos| records[pos].start_time.instant());

    let width = segment_width(group.len());
    if width > ORDER_SEGMENT_WIDTH {
        warn!(
            "{} siblings under {:?}; widening order path segments to {} digits",
            group.len(),
            prefix,
            width
        );
        report.widened_groups += 1;
    }

    // reversed so the earliest sibling is popped first
    for (rank, pos) in group.into_iter().enumerate().rev() {
        let path = if prefix.is_empty() {
            format!("{:0width$}", rank, width = width)
        } else {
            format!("{}{}{:0width$}", prefix, ORDER_SEPARATOR, rank, width = width)
        };
        stack.push((pos, path));
    }
}

/// Digits needed for the largest rank in a group of `count`
fn segment_width(count: usize) -> usize {
    let max_rank = count.saturating_sub(1);
    let digits = max_rank.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(ORDER_SEGMENT_WIDTH)
}
