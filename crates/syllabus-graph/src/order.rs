//! Study order computation: build, sort, report.

use std::collections::HashMap;

use serde::Serialize;

use syllabus_core::{Topic, TopicId};

use crate::cycle::CycleReport;
use crate::graph::{DanglingPrerequisite, SubjectGraph};
use crate::sort::{topological_sort, SortOutcome};

pub const ORDER_FOUND_MESSAGE: &str = "Study order determined successfully.";
pub const CYCLE_FOUND_MESSAGE: &str =
    "Cycle detected in prerequisites; no linear study order exists.";

/// The answer to "in what order can I study everything?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyOrder {
    /// Topics in study order. Empty when a cycle exists.
    pub order: Vec<Topic>,
    pub has_cycle: bool,
    /// Every topic the sort could not place, by name then id. Includes
    /// topics that only depend on a cycle.
    pub cycle_member_names: Vec<String>,
    /// Topics on each actual cycle.
    pub minimal_cycles: Vec<Vec<String>>,
    /// Prerequisite references that named no existing topic.
    pub dangling: Vec<DanglingPrerequisite>,
    pub message: String,
}

impl StudyOrder {
    pub fn cycle_report(&self) -> CycleReport {
        CycleReport {
            member_names: self.cycle_member_names.clone(),
            minimal_cycles: self.minimal_cycles.clone(),
        }
    }
}

/// Compute the study order for one owner's complete topic snapshot.
pub fn compute_order(topics: &[Topic]) -> StudyOrder {
    let graph = SubjectGraph::build(topics);
    let dangling = graph.dangling().to_vec();

    match topological_sort(&graph) {
        SortOutcome::Ordered(ids) => {
            let by_id: HashMap<&TopicId, &Topic> = topics.iter().map(|t| (&t.id, t)).collect();
            let order = ids
                .iter()
                .filter_map(|id| by_id.get(id).map(|t| (*t).clone()))
                .collect();
            StudyOrder {
                order,
                has_cycle: false,
                cycle_member_names: Vec::new(),
                minimal_cycles: Vec::new(),
                dangling,
                message: ORDER_FOUND_MESSAGE.to_string(),
            }
        }
        SortOutcome::Cycle { remaining } => {
            let report = CycleReport::new(&graph, &remaining);
            tracing::info!(
                members = report.member_names.len(),
                cycles = report.minimal_cycles.len(),
                "subject graph contains a cycle"
            );
            StudyOrder {
                order: Vec::new(),
                has_cycle: true,
                cycle_member_names: report.member_names,
                minimal_cycles: report.minimal_cycles,
                dangling,
                message: CYCLE_FOUND_MESSAGE.to_string(),
            }
        }
    }
}
