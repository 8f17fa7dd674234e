//! Handler for `syllabus remove`.

use miette::Result;

use syllabus_util::errors::SyllabusError;

use super::Session;

pub async fn exec(session: &Session, topic: &str) -> Result<()> {
    let topics = session.topics().await?;
    let id = Session::resolve(&topics, topic)?;

    let removed = session
        .service
        .delete_topic(&session.owner, &id)
        .await
        .map_err(SyllabusError::from)?;

    println!("Removed topic '{}' ({})", removed.name, removed.id);
    Ok(())
}
