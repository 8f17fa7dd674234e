//! Handler for `syllabus add`.

use miette::Result;

use syllabus_core::NewTopic;
use syllabus_util::errors::SyllabusError;

use super::Session;

pub async fn exec(
    session: &Session,
    name: &str,
    description: Option<String>,
    requires: &[String],
) -> Result<()> {
    let topics = session.topics().await?;
    let prerequisites = Session::resolve_all(&topics, requires)?;

    let created = session
        .service
        .create_topic(&session.owner, NewTopic::new(name, description, prerequisites))
        .await
        .map_err(SyllabusError::from)?;

    println!("Created topic '{}' ({})", created.name, created.id);
    Ok(())
}
