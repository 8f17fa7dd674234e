//! Owner-scoped orchestration of the graph engine against a topic store.
//!
//! Every operation works on one owner's subject graph. Mutations run their
//! validate-then-write sequence while holding that owner's lock, so two
//! concurrent edits by the same owner cannot both pass validation against
//! the same stale snapshot. Different owners never share a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use miette::Diagnostic;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use syllabus_core::config::{CyclePolicy, GraphConfig};
use syllabus_core::store::{StoreError, TopicStore};
use syllabus_core::{NewTopic, OwnerId, Topic, TopicId, TopicPatch};
use syllabus_util::errors::SyllabusError;

use crate::order::{compute_order, StudyOrder};
use crate::validate::{MutationValidator, ValidationError};

/// Errors returned by [`PrerequisiteGraphService`].
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    /// The request was refused; the store is unchanged.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed. Passed through as-is, without retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ServiceError::Validation(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}

impl From<ServiceError> for SyllabusError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => SyllabusError::Validation {
                message: e.to_string(),
                help: e.help().map(|h| h.to_string()),
            },
            ServiceError::Store(e) => SyllabusError::Store {
                message: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

type OwnerLocks = SyncMutex<HashMap<OwnerId, Arc<Mutex<()>>>>;

/// Holds one owner's lock. On release the owner's entry is dropped from the
/// lock table unless another task is still waiting on it.
struct OwnerGuard<'a> {
    locks: &'a OwnerLocks,
    owner: OwnerId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.owner)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.owner);
        }
    }
}

/// The prerequisite graph engine bound to a store.
pub struct PrerequisiteGraphService {
    store: Arc<dyn TopicStore>,
    policy: CyclePolicy,
    owner_locks: OwnerLocks,
    order_cache: Option<Mutex<HashMap<OwnerId, StudyOrder>>>,
}

impl PrerequisiteGraphService {
    /// A service with lazy cycle detection and no order cache.
    pub fn new(store: Arc<dyn TopicStore>) -> Self {
        Self {
            store,
            policy: CyclePolicy::Lazy,
            owner_locks: SyncMutex::new(HashMap::new()),
            order_cache: None,
        }
    }

    /// A service configured from the `[graph]` config section.
    pub fn from_config(store: Arc<dyn TopicStore>, config: &GraphConfig) -> Self {
        Self::new(store)
            .with_cycle_policy(config.cycle_policy)
            .with_order_cache(config.cache_orders)
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep each owner's last computed order until that owner mutates.
    pub fn with_order_cache(mut self, enabled: bool) -> Self {
        self.order_cache = enabled.then(|| Mutex::new(HashMap::new()));
        self
    }

    pub fn cycle_policy(&self) -> CyclePolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn TopicStore> {
        &self.store
    }

    async fn lock_owner(&self, owner: &OwnerId) -> OwnerGuard<'_> {
        let lock = {
            let mut locks = self
                .owner_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(owner.clone()).or_default())
        };
        OwnerGuard {
            locks: &self.owner_locks,
            owner: owner.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    async fn invalidate(&self, owner: &OwnerId) {
        if let Some(cache) = &self.order_cache {
            if cache.lock().await.remove(owner).is_some() {
                tracing::debug!(owner = %owner, "invalidated cached study order");
            }
        }
    }

    /// All topics of `owner`, by name.
    pub async fn list_topics(&self, owner: &OwnerId) -> Result<Vec<Topic>> {
        Ok(self.store.list_topics(owner).await?)
    }

    /// One topic of `owner`.
    pub async fn get_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Topic> {
        self.store
            .get_topic(owner, id)
            .await?
            .ok_or_else(|| ValidationError::NotFound { id: *id }.into())
    }

    /// Validate and store a new topic.
    pub async fn create_topic(&self, owner: &OwnerId, topic: NewTopic) -> Result<Topic> {
        let topic = topic.normalized();
        let _guard = self.lock_owner(owner).await;
        let snapshot = self.store.list_topics(owner).await?;
        MutationValidator::new(&snapshot)
            .with_policy(self.policy)
            .check_create(&topic)?;

        let created = self.store.insert_topic(owner, topic).await?;
        self.invalidate(owner).await;
        tracing::info!(owner = %owner, topic = %created.id, name = %created.name, "created topic");
        Ok(created)
    }

    /// Validate and apply a partial update.
    pub async fn update_topic(
        &self,
        owner: &OwnerId,
        id: &TopicId,
        patch: TopicPatch,
    ) -> Result<Topic> {
        let patch = patch.normalized();
        let _guard = self.lock_owner(owner).await;
        let snapshot = self.store.list_topics(owner).await?;
        let mut updated = MutationValidator::new(&snapshot)
            .with_policy(self.policy)
            .check_update(id, &patch)?;
        updated.touch();

        self.store.replace_topic(&updated).await?;
        self.invalidate(owner).await;
        tracing::info!(owner = %owner, topic = %updated.id, name = %updated.name, "updated topic");
        Ok(updated)
    }

    /// Delete a topic and strip it from every sibling's prerequisites in a
    /// single store write.
    ///
    /// Returns the deleted topic.
    pub async fn delete_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Topic> {
        let _guard = self.lock_owner(owner).await;
        let deleted = self
            .store
            .delete_topic(owner, id)
            .await?
            .ok_or(ValidationError::NotFound { id: *id })?;
        self.invalidate(owner).await;

        tracing::info!(
            owner = %owner,
            topic = %deleted.topic.id,
            name = %deleted.topic.name,
            dependents_updated = deleted.dependents_updated,
            "deleted topic"
        );
        Ok(deleted.topic)
    }

    /// Compute the study order for `owner`'s current subject graph.
    pub async fn compute_order(&self, owner: &OwnerId) -> Result<StudyOrder> {
        let _guard = self.lock_owner(owner).await;
        if let Some(cache) = &self.order_cache {
            if let Some(order) = cache.lock().await.get(owner) {
                tracing::debug!(owner = %owner, "serving cached study order");
                return Ok(order.clone());
            }
        }

        let snapshot = self.store.list_topics(owner).await?;
        let order = compute_order(&snapshot);

        if let Some(cache) = &self.order_cache {
            cache.lock().await.insert(owner.clone(), order.clone());
        }
        Ok(order)
    }
}
