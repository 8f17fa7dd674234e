//! Deterministic Kahn topological sort over a [`SubjectGraph`].
//!
//! The ready queue is kept ordered by (name, id). Popping from its front and
//! inserting newly freed topics at their sorted position makes the output
//! independent of snapshot order and hash iteration order.

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use syllabus_core::TopicId;

use crate::graph::SubjectGraph;

/// Result of sorting a subject graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome {
    /// Every topic, each preceded by all of its prerequisites.
    Ordered(Vec<TopicId>),
    /// The sort stalled. `remaining` holds every topic whose in-degree never
    /// reached zero, sorted by name then id. This is a superset of the
    /// topics that lie on a cycle.
    Cycle { remaining: Vec<TopicId> },
}

impl SortOutcome {
    pub fn has_cycle(&self) -> bool {
        matches!(self, SortOutcome::Cycle { .. })
    }
}

/// Run Kahn's algorithm on `graph`.
pub fn topological_sort(graph: &SubjectGraph) -> SortOutcome {
    let mut in_degree: Vec<usize> = vec![0; graph.len()];
    let mut ready: BTreeSet<(&str, TopicId, NodeIndex)> = BTreeSet::new();

    for idx in graph.node_indices() {
        let degree = graph.in_degree(idx);
        in_degree[idx.index()] = degree;
        if degree == 0 {
            ready.insert(ready_entry(graph, idx));
        }
    }

    let mut order = Vec::with_capacity(graph.len());
    while let Some((_, id, idx)) = ready.pop_first() {
        order.push(id);
        for dependent in graph.dependents(idx) {
            let degree = &mut in_degree[dependent.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.insert(ready_entry(graph, dependent));
            }
        }
    }

    if order.len() == graph.len() {
        tracing::debug!(topics = order.len(), "topological sort complete");
        return SortOutcome::Ordered(order);
    }

    let mut stuck: Vec<(&str, TopicId)> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] > 0)
        .map(|idx| graph.node(idx).key())
        .collect();
    stuck.sort();
    tracing::debug!(
        emitted = order.len(),
        total = graph.len(),
        stuck = stuck.len(),
        "topological sort stalled on a cycle"
    );
    SortOutcome::Cycle {
        remaining: stuck.into_iter().map(|(_, id)| id).collect(),
    }
}

fn ready_entry(graph: &SubjectGraph, idx: NodeIndex) -> (&str, TopicId, NodeIndex) {
    let (name, id) = graph.node(idx).key();
    (name, id, idx)
}
