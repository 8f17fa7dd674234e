use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{strip_prerequisite, DeletedTopic, Result, StoreError, TopicStore};
use crate::topic::{sort_topics, NewTopic, OwnerId, Topic, TopicId};

type OwnerTopics = BTreeMap<TopicId, Topic>;

/// In-memory topic store.
///
/// Each owner gets its own map, so reads and writes for one owner never see
/// another owner's records. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryTopicStore {
    owners: RwLock<HashMap<OwnerId, OwnerTopics>>,
}

impl InMemoryTopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a topic exactly as given, bypassing id assignment.
    ///
    /// Used to load snapshots and to reproduce damaged data in tests.
    pub async fn import(&self, topic: Topic) {
        let mut owners = self.owners.write().await;
        owners
            .entry(topic.owner.clone())
            .or_default()
            .insert(topic.id, topic);
    }

    /// Total number of topics across all owners.
    pub async fn len(&self) -> usize {
        self.owners.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TopicStore for InMemoryTopicStore {
    async fn list_topics(&self, owner: &OwnerId) -> Result<Vec<Topic>> {
        let owners = self.owners.read().await;
        let mut topics: Vec<Topic> = owners
            .get(owner)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        sort_topics(&mut topics);
        Ok(topics)
    }

    async fn get_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<Topic>> {
        let owners = self.owners.read().await;
        Ok(owners.get(owner).and_then(|m| m.get(id)).cloned())
    }

    async fn insert_topic(&self, owner: &OwnerId, topic: NewTopic) -> Result<Topic> {
        let stored = Topic::from_new(owner.clone(), topic);
        let mut owners = self.owners.write().await;
        owners
            .entry(owner.clone())
            .or_default()
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn replace_topic(&self, topic: &Topic) -> Result<()> {
        let mut owners = self.owners.write().await;
        let slot = owners
            .get_mut(&topic.owner)
            .and_then(|m| m.get_mut(&topic.id))
            .ok_or(StoreError::MissingRecord { id: topic.id })?;
        *slot = topic.clone();
        Ok(())
    }

    async fn delete_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<DeletedTopic>> {
        let mut owners = self.owners.write().await;
        let Some(topics) = owners.get_mut(owner) else {
            return Ok(None);
        };
        let Some(topic) = topics.remove(id) else {
            return Ok(None);
        };
        let dependents_updated = strip_prerequisite(topics.values_mut(), id);
        Ok(Some(DeletedTopic {
            topic,
            dependents_updated,
        }))
    }
}
