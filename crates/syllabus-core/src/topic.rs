//! Topic records and the identities that scope them.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(Uuid);

impl TopicId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TopicId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Identity of the user who owns a subject graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored topic of study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub owner: OwnerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ids of topics that must be studied before this one, in declaration order.
    #[serde(default)]
    pub prerequisites: Vec<TopicId>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// A fresh topic with a new id, stamped with the current time.
    pub fn new(owner: OwnerId, name: impl AsRef<str>, prerequisites: Vec<TopicId>) -> Self {
        let now = Utc::now();
        Self {
            id: TopicId::generate(),
            owner,
            name: normalize_name(name.as_ref()),
            description: None,
            prerequisites: dedup_ids(prerequisites),
            created_at: now,
            updated_at: now,
        }
    }

    /// Materialize a creation request for `owner`.
    pub fn from_new(owner: OwnerId, new: NewTopic) -> Self {
        let new = new.normalized();
        let mut topic = Self::new(owner, &new.name, new.prerequisites);
        topic.description = new.description;
        topic
    }

    /// Mark the topic as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Deterministic ordering key: name first, id breaks ties.
    pub fn sort_key(&self) -> (&str, &TopicId) {
        (self.name.as_str(), &self.id)
    }

    /// Whether `id` is listed among this topic's prerequisites.
    pub fn requires(&self, id: &TopicId) -> bool {
        self.prerequisites.contains(id)
    }
}

/// Compare two topics by [`Topic::sort_key`].
pub fn by_name_then_id(a: &Topic, b: &Topic) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// Sort topics by name, ties broken by id.
pub fn sort_topics(topics: &mut [Topic]) {
    topics.sort_by(by_name_then_id);
}

/// Input for creating a topic. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub description: Option<String>,
    pub prerequisites: Vec<TopicId>,
}

impl NewTopic {
    /// Build a normalized creation request: the name and description are
    /// trimmed, a blank description is dropped, and repeated prerequisite ids
    /// collapse to their first occurrence.
    pub fn new(
        name: impl AsRef<str>,
        description: Option<String>,
        prerequisites: impl IntoIterator<Item = TopicId>,
    ) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            description: normalize_description(description),
            prerequisites: dedup_ids(prerequisites),
        }
    }

    /// Apply the normalization of [`NewTopic::new`] to a request that may
    /// have been built field by field.
    pub fn normalized(self) -> Self {
        Self::new(self.name, self.description, self.prerequisites)
    }
}

/// Partial replacement of a topic. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prerequisites: Option<Vec<TopicId>>,
}

impl TopicPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(normalize_name(name.as_ref()));
        self
    }

    /// Replace the description. An empty string clears it.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into().trim().to_string());
        self
    }

    /// Replace the whole prerequisite set. An empty list clears it.
    pub fn prerequisites(mut self, ids: impl IntoIterator<Item = TopicId>) -> Self {
        self.prerequisites = Some(dedup_ids(ids));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.prerequisites.is_none()
    }

    /// Trim and deduplicate a patch that may have been built field by field.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| normalize_name(&n)),
            description: self.description.map(|d| d.trim().to_string()),
            prerequisites: self.prerequisites.map(dedup_ids),
        }
    }

    /// Apply the patch onto `topic`, leaving untouched fields as they were.
    pub fn apply_to(&self, topic: &mut Topic) {
        if let Some(name) = &self.name {
            topic.name = normalize_name(name);
        }
        if let Some(description) = &self.description {
            topic.description = normalize_description(Some(description.clone()));
        }
        if let Some(prerequisites) = &self.prerequisites {
            topic.prerequisites = dedup_ids(prerequisites.iter().copied());
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn dedup_ids(ids: impl IntoIterator<Item = TopicId>) -> Vec<TopicId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
