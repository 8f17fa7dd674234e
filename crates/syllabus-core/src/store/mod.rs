//! Persistence layer for topics.
//!
//! The [`TopicStore`] trait is the only way the rest of Syllabus reaches
//! stored topics. Two backends ship with the crate:
//!
//! - [`InMemoryTopicStore`]: owner-partitioned maps, for tests and embedding
//! - [`TomlTopicStore`]: a single TOML file holding every owner's topics
//!
//! Stores do no validation. They persist what they are given; structural
//! checks happen before a write reaches them.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::topic::{NewTopic, OwnerId, Topic, TopicId};

mod file;
mod memory;

pub use file::TomlTopicStore;
pub use memory::InMemoryTopicStore;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid topic store.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Topics could not be encoded for writing.
    #[error("failed to serialize topics: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A record expected to exist was not found during a write.
    #[error("topic {id} is not present in the store")]
    MissingRecord { id: TopicId },

    /// The backend cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of [`TopicStore::delete_topic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTopic {
    pub topic: Topic,
    /// How many sibling topics had the deleted id stripped from their prerequisites.
    pub dependents_updated: usize,
}

/// Storage backend for topics, partitioned by owner.
///
/// Implementations must be thread-safe. Every method touches one owner's
/// records only.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// All topics of `owner`, sorted by name then id.
    async fn list_topics(&self, owner: &OwnerId) -> Result<Vec<Topic>>;

    /// A single topic, if it exists and belongs to `owner`.
    async fn get_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<Topic>>;

    /// Persist a new topic under a freshly assigned id and return it.
    async fn insert_topic(&self, owner: &OwnerId, topic: NewTopic) -> Result<Topic>;

    /// Overwrite an existing topic (matched by owner and id).
    async fn replace_topic(&self, topic: &Topic) -> Result<()>;

    /// Remove a topic and strip its id from the prerequisites of every other
    /// topic of `owner`, as one write. Returns `None` when there was no such
    /// topic, in which case nothing changed.
    async fn delete_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<DeletedTopic>>;
}

/// Drop `id` from each topic's prerequisites, returning how many changed.
fn strip_prerequisite<'a>(topics: impl Iterator<Item = &'a mut Topic>, id: &TopicId) -> usize {
    let mut touched = 0;
    for topic in topics {
        if topic.requires(id) {
            topic.prerequisites.retain(|p| p != id);
            topic.touch();
            touched += 1;
        }
    }
    touched
}
