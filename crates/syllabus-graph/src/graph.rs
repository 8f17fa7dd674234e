//! Subject graph construction.
//!
//! Edges point from a prerequisite to the topic that depends on it, so a
//! node's in-degree is the number of prerequisites it lists.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use syllabus_core::{Topic, TopicId};

/// A node in the subject graph.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TopicNode {
    pub id: TopicId,
    pub name: String,
}

impl TopicNode {
    /// Deterministic ordering key: name first, id breaks ties.
    pub fn key(&self) -> (&str, TopicId) {
        (self.name.as_str(), self.id)
    }
}

impl fmt::Display for TopicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A prerequisite id that names no topic in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingPrerequisite {
    pub topic: TopicId,
    pub topic_name: String,
    pub prerequisite: TopicId,
}

impl fmt::Display for DanglingPrerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prerequisite {} of '{}' does not exist",
            self.prerequisite, self.topic_name
        )
    }
}

/// One owner's topics and prerequisite edges, backed by petgraph.
#[derive(Debug, Clone, Default)]
pub struct SubjectGraph {
    graph: DiGraph<TopicNode, ()>,
    index: HashMap<TopicId, NodeIndex>,
    dangling: Vec<DanglingPrerequisite>,
}

impl SubjectGraph {
    /// Build the graph from a complete snapshot of one owner's topics.
    ///
    /// Prerequisites that reference no topic in `topics` are left out of the
    /// graph and recorded in [`SubjectGraph::dangling`]. A prerequisite
    /// listed twice counts once.
    pub fn build(topics: &[Topic]) -> Self {
        let mut graph = DiGraph::with_capacity(topics.len(), topics.len());
        let mut index = HashMap::with_capacity(topics.len());

        for topic in topics {
            let idx = graph.add_node(TopicNode {
                id: topic.id,
                name: topic.name.clone(),
            });
            index.insert(topic.id, idx);
        }

        let mut built = Self {
            graph,
            index,
            dangling: Vec::new(),
        };

        for topic in topics {
            let dependent = built.index[&topic.id];
            for prerequisite in &topic.prerequisites {
                match built.index.get(prerequisite) {
                    Some(&from) => built.add_edge(from, dependent),
                    None => {
                        tracing::warn!(
                            topic = %topic.id,
                            name = %topic.name,
                            prerequisite = %prerequisite,
                            "prerequisite does not name an existing topic, ignoring edge"
                        );
                        built.dangling.push(DanglingPrerequisite {
                            topic: topic.id,
                            topic_name: topic.name.clone(),
                            prerequisite: *prerequisite,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            nodes = built.graph.node_count(),
            edges = built.graph.edge_count(),
            dangling = built.dangling.len(),
            "built subject graph"
        );
        built
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node index by topic id.
    pub fn find(&self, id: &TopicId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &TopicNode {
        &self.graph[idx]
    }

    /// All node indices, in snapshot order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Topics that list `idx` as a prerequisite.
    pub fn dependents(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
    }

    /// Topics listed as prerequisites of `idx` that exist in the graph.
    pub fn prerequisites(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
    }

    /// Number of resolved prerequisites of `idx`.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .count()
    }

    /// Adjacency by id: each topic maps to the topics depending on it,
    /// sorted by name then id.
    pub fn adjacency(&self) -> HashMap<TopicId, Vec<TopicId>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let mut dependents: Vec<&TopicNode> =
                    self.dependents(idx).map(|d| &self.graph[d]).collect();
                dependents.sort_by(|a, b| a.key().cmp(&b.key()));
                (
                    self.graph[idx].id,
                    dependents.into_iter().map(|d| d.id).collect(),
                )
            })
            .collect()
    }

    /// In-degree by id.
    pub fn in_degrees(&self) -> HashMap<TopicId, usize> {
        self.graph
            .node_indices()
            .map(|idx| (self.graph[idx].id, self.in_degree(idx)))
            .collect()
    }

    /// Prerequisite references that were dropped while building.
    pub fn dangling(&self) -> &[DanglingPrerequisite] {
        &self.dangling
    }

    /// Whether `dependent` is reachable from `prerequisite` by following
    /// prerequisite edges forward, i.e. `dependent` (transitively) requires it.
    pub fn depends_on(&self, dependent: &TopicId, prerequisite: &TopicId) -> bool {
        match (self.find(prerequisite), self.find(dependent)) {
            (Some(from), Some(to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    pub(crate) fn inner(&self) -> &DiGraph<TopicNode, ()> {
        &self.graph
    }
}
