//! Cycle reporting.
//!
//! Two views are offered. The conservative member set is what the sort left
//! behind: every topic that could not be reached, cyclic or merely downstream
//! of a cycle. The minimal view lists the strongly connected components that
//! actually contain a cycle.

use std::fmt;

use petgraph::algo::tarjan_scc;
use serde::Serialize;

use syllabus_core::TopicId;

use crate::graph::SubjectGraph;

/// Diagnostic for a subject graph that has no valid study order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Names of every topic left unsorted, by name then id.
    pub member_names: Vec<String>,
    /// Names of the topics on each individual cycle.
    pub minimal_cycles: Vec<Vec<String>>,
}

impl CycleReport {
    /// Build a report from the ids the sort left behind.
    pub fn new(graph: &SubjectGraph, remaining: &[TopicId]) -> Self {
        let member_names = remaining
            .iter()
            .filter_map(|id| graph.find(id))
            .map(|idx| graph.node(idx).name.clone())
            .collect();
        let minimal_cycles = minimal_cycles(graph)
            .into_iter()
            .map(|cycle| {
                cycle
                    .iter()
                    .filter_map(|id| graph.find(id))
                    .map(|idx| graph.node(idx).name.clone())
                    .collect()
            })
            .collect();
        Self {
            member_names,
            minimal_cycles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.member_names.is_empty()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.member_names.is_empty() {
            return write!(f, "No cycles.");
        }
        writeln!(
            f,
            "Topics without a valid position ({}): {}",
            self.member_names.len(),
            self.member_names.join(", ")
        )?;
        for cycle in &self.minimal_cycles {
            writeln!(f, "  cycle among: {}", cycle.join(", "))?;
        }
        Ok(())
    }
}

/// Strongly connected components that contain a cycle: every component with
/// more than one topic, plus single topics that list themselves.
///
/// Topics inside a component are sorted by name then id, and components are
/// sorted by their first topic.
pub fn minimal_cycles(graph: &SubjectGraph) -> Vec<Vec<TopicId>> {
    let inner = graph.inner();
    let mut cycles: Vec<Vec<(&str, TopicId)>> = tarjan_scc(inner)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => inner.contains_edge(*single, *single),
            _ => true,
        })
        .map(|component| {
            let mut keys: Vec<(&str, TopicId)> =
                component.iter().map(|&idx| graph.node(idx).key()).collect();
            keys.sort();
            keys
        })
        .collect();
    cycles.sort();
    cycles
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|(_, id)| id).collect())
        .collect()
}
