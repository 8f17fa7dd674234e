//! Command dispatch and handler modules.

mod add;
mod edit;
mod list;
mod order;
mod remove;

use std::path::PathBuf;
use std::sync::Arc;

use miette::Result;

use syllabus_core::config::GlobalConfig;
use syllabus_core::store::TomlTopicStore;
use syllabus_core::{OwnerId, Topic, TopicId};
use syllabus_graph::PrerequisiteGraphService;
use syllabus_util::errors::SyllabusError;

use crate::cli::{Cli, Command};

/// Everything a command needs: the acting owner and a service bound to the store.
pub struct Session {
    pub owner: OwnerId,
    pub service: PrerequisiteGraphService,
}

impl Session {
    fn open(owner: Option<&str>, store: Option<PathBuf>) -> Result<Self> {
        let config = GlobalConfig::load()?;
        let owner = config.resolve_owner(owner);
        let store_path = store.unwrap_or_else(|| config.store_path());
        tracing::debug!(owner = %owner, store = %store_path.display(), "opening session");

        let store = Arc::new(TomlTopicStore::new(store_path));
        let service = PrerequisiteGraphService::from_config(store, &config.graph);
        Ok(Self { owner, service })
    }

    pub async fn topics(&self) -> Result<Vec<Topic>> {
        self.service
            .list_topics(&self.owner)
            .await
            .map_err(|e| SyllabusError::from(e).into())
    }

    /// Resolve a command-line reference: an exact id first, then an exact name.
    pub fn resolve(topics: &[Topic], reference: &str) -> Result<TopicId> {
        if let Ok(id) = reference.parse::<TopicId>() {
            if topics.iter().any(|t| t.id == id) {
                return Ok(id);
            }
        }
        let name = reference.trim();
        topics
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| {
                SyllabusError::UnknownTopic {
                    reference: reference.to_string(),
                }
                .into()
            })
    }

    pub fn resolve_all(topics: &[Topic], references: &[String]) -> Result<Vec<TopicId>> {
        references
            .iter()
            .map(|r| Self::resolve(topics, r))
            .collect()
    }
}

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let session = Session::open(cli.owner.as_deref(), cli.store)?;
    match cli.command {
        Command::List => list::exec(&session).await,
        Command::Add {
            name,
            description,
            requires,
        } => add::exec(&session, &name, description, &requires).await,
        Command::Edit {
            topic,
            name,
            description,
            requires,
            clear_requires,
        } => {
            edit::exec(
                &session,
                &topic,
                name,
                description,
                &requires,
                clear_requires,
            )
            .await
        }
        Command::Remove { topic } => remove::exec(&session, &topic).await,
        Command::Order { json } => order::exec(&session, json).await,
    }
}
