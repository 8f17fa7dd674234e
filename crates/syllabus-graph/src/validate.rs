//! Structural checks applied before a topic mutation reaches the store.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use syllabus_core::config::CyclePolicy;
use syllabus_core::topic::normalize_name;
use syllabus_core::{NewTopic, Topic, TopicId, TopicPatch};

use crate::graph::SubjectGraph;

/// Why a mutation was refused. Nothing has been written when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("topic name must not be empty")]
    EmptyName,

    #[error("a topic named '{name}' already exists")]
    #[diagnostic(help("topic names are unique per owner; pick another name"))]
    DuplicateName { name: String },

    #[error("prerequisites not found: {}", join_ids(.ids))]
    #[diagnostic(help("prerequisites must be existing topics of the same owner"))]
    InvalidPrerequisite { ids: Vec<TopicId> },

    #[error("'{name}' cannot be its own prerequisite")]
    SelfReference { id: TopicId, name: String },

    #[error("topic {id} not found")]
    NotFound { id: TopicId },

    #[error("making '{prerequisite}' a prerequisite of '{topic}' would create a cycle")]
    #[diagnostic(help("'{prerequisite}' already depends on '{topic}'"))]
    CycleRejected { topic: String, prerequisite: String },
}

fn join_ids(ids: &[TopicId]) -> String {
    ids.iter()
        .map(TopicId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates mutations against a snapshot of one owner's topics.
#[derive(Debug)]
pub struct MutationValidator<'a> {
    topics: &'a [Topic],
    by_id: HashMap<TopicId, &'a Topic>,
    policy: CyclePolicy,
}

impl<'a> MutationValidator<'a> {
    pub fn new(topics: &'a [Topic]) -> Self {
        Self {
            topics,
            by_id: topics.iter().map(|t| (t.id, t)).collect(),
            policy: CyclePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check a creation request.
    ///
    /// A new topic has no dependents yet, so it cannot close a cycle and no
    /// reachability check is needed regardless of policy.
    pub fn check_create(&self, new: &NewTopic) -> Result<(), ValidationError> {
        self.check_name(&new.name, None)?;
        self.check_prerequisites_exist(&new.prerequisites)
    }

    /// Check an update and return the topic as it would be stored.
    pub fn check_update(&self, id: &TopicId, patch: &TopicPatch) -> Result<Topic, ValidationError> {
        let current = self
            .by_id
            .get(id)
            .copied()
            .ok_or(ValidationError::NotFound { id: *id })?;

        if let Some(name) = &patch.name {
            self.check_name(name, Some(id))?;
        }

        if let Some(prerequisites) = &patch.prerequisites {
            if prerequisites.contains(id) {
                return Err(ValidationError::SelfReference {
                    id: *id,
                    name: current.name.clone(),
                });
            }
            self.check_prerequisites_exist(prerequisites)?;
            if self.policy == CyclePolicy::Reject {
                self.check_acyclic(current, prerequisites)?;
            }
        }

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        Ok(updated)
    }

    /// Names are compared after trimming, whatever form the request arrived in.
    fn check_name(&self, name: &str, exclude: Option<&TopicId>) -> Result<(), ValidationError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let taken = self
            .topics
            .iter()
            .any(|t| normalize_name(&t.name) == name && Some(&t.id) != exclude);
        if taken {
            return Err(ValidationError::DuplicateName { name });
        }
        Ok(())
    }

    fn check_prerequisites_exist(&self, prerequisites: &[TopicId]) -> Result<(), ValidationError> {
        let missing: Vec<TopicId> = prerequisites
            .iter()
            .filter(|id| !self.by_id.contains_key(id))
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidPrerequisite { ids: missing })
        }
    }

    /// Refuse any newly added prerequisite that already depends on `topic`.
    fn check_acyclic(&self, topic: &Topic, prerequisites: &[TopicId]) -> Result<(), ValidationError> {
        let added: Vec<&TopicId> = prerequisites
            .iter()
            .filter(|p| !topic.requires(p))
            .collect();
        if added.is_empty() {
            return Ok(());
        }

        let graph = SubjectGraph::build(self.topics);
        for prerequisite in added {
            if graph.depends_on(prerequisite, &topic.id) {
                let prerequisite_name = self
                    .by_id
                    .get(prerequisite)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| prerequisite.to_string());
                return Err(ValidationError::CycleRejected {
                    topic: topic.name.clone(),
                    prerequisite: prerequisite_name,
                });
            }
        }
        Ok(())
    }
}
