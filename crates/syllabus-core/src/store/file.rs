use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{strip_prerequisite, DeletedTopic, Result, StoreError, TopicStore};
use crate::topic::{sort_topics, NewTopic, OwnerId, Topic, TopicId};

/// On-disk layout: one `[[topic]]` table per record, for every owner.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, rename = "topic")]
    topics: Vec<Topic>,
}

/// Topic store backed by a single TOML file.
///
/// Each call reads the file, applies its change and writes the whole file
/// back atomically. A missing file is an empty store. Writers within one
/// process are serialized; separate processes sharing the file are not.
#[derive(Debug)]
pub struct TomlTopicStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TomlTopicStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreFile> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "store file missing, starting empty");
                return Ok(StoreFile::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    async fn save(&self, file: &StoreFile) -> Result<()> {
        let content = toml::to_string_pretty(file)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            syllabus_util::fs::write_atomic(&path, content.as_bytes())
                .map_err(|source| StoreError::Io { path, source })
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store writer task failed: {e}")))?
    }

    /// Load, let `edit` change the records, and save if it reports a change.
    async fn modify<T>(&self, edit: impl FnOnce(&mut Vec<Topic>) -> (T, bool)) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        let (value, changed) = edit(&mut file.topics);
        if changed {
            self.save(&file).await?;
        }
        Ok(value)
    }
}

#[async_trait]
impl TopicStore for TomlTopicStore {
    async fn list_topics(&self, owner: &OwnerId) -> Result<Vec<Topic>> {
        let file = self.load().await?;
        let mut topics: Vec<Topic> = file
            .topics
            .into_iter()
            .filter(|t| &t.owner == owner)
            .collect();
        sort_topics(&mut topics);
        Ok(topics)
    }

    async fn get_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<Topic>> {
        let file = self.load().await?;
        Ok(file
            .topics
            .into_iter()
            .find(|t| &t.owner == owner && &t.id == id))
    }

    async fn insert_topic(&self, owner: &OwnerId, topic: NewTopic) -> Result<Topic> {
        let stored = Topic::from_new(owner.clone(), topic);
        let record = stored.clone();
        self.modify(move |topics| {
            topics.push(record);
            ((), true)
        })
        .await?;
        Ok(stored)
    }

    async fn replace_topic(&self, topic: &Topic) -> Result<()> {
        let replaced = self
            .modify(|topics| {
                match topics
                    .iter_mut()
                    .find(|t| t.owner == topic.owner && t.id == topic.id)
                {
                    Some(slot) => {
                        *slot = topic.clone();
                        (true, true)
                    }
                    None => (false, false),
                }
            })
            .await?;
        if replaced {
            Ok(())
        } else {
            Err(StoreError::MissingRecord { id: topic.id })
        }
    }

    async fn delete_topic(&self, owner: &OwnerId, id: &TopicId) -> Result<Option<DeletedTopic>> {
        self.modify(|topics| {
            let Some(pos) = topics
                .iter()
                .position(|t| &t.owner == owner && &t.id == id)
            else {
                return (None, false);
            };
            let topic = topics.remove(pos);
            let dependents_updated =
                strip_prerequisite(topics.iter_mut().filter(|t| &t.owner == owner), id);
            (
                Some(DeletedTopic {
                    topic,
                    dependents_updated,
                }),
                true,
            )
        })
        .await
    }
}
