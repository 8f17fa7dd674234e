//! Handler for `syllabus edit`.

use miette::Result;

use syllabus_core::TopicPatch;
use syllabus_util::errors::SyllabusError;

use super::Session;

pub async fn exec(
    session: &Session,
    topic: &str,
    name: Option<String>,
    description: Option<String>,
    requires: &[String],
    clear_requires: bool,
) -> Result<()> {
    let topics = session.topics().await?;
    let id = Session::resolve(&topics, topic)?;

    let mut patch = TopicPatch::new();
    if let Some(name) = name {
        patch = patch.name(name);
    }
    if let Some(description) = description {
        patch = patch.description(description);
    }
    if clear_requires {
        patch = patch.prerequisites(Vec::new());
    } else if !requires.is_empty() {
        patch = patch.prerequisites(Session::resolve_all(&topics, requires)?);
    }

    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let updated = session
        .service
        .update_topic(&session.owner, &id, patch)
        .await
        .map_err(SyllabusError::from)?;

    println!("Updated topic '{}' ({})", updated.name, updated.id);
    Ok(())
}
