//! Handler for `syllabus list`.

use std::collections::HashMap;

use console::style;
use miette::Result;

use syllabus_core::TopicId;

use super::Session;

pub async fn exec(session: &Session) -> Result<()> {
    let topics = session.topics().await?;
    if topics.is_empty() {
        println!("No topics yet.");
        return Ok(());
    }

    let names: HashMap<TopicId, &str> = topics.iter().map(|t| (t.id, t.name.as_str())).collect();
    for topic in &topics {
        println!("{}  {}", style(&topic.name).bold(), style(topic.id).dim());
        if let Some(description) = &topic.description {
            println!("    {description}");
        }
        if !topic.prerequisites.is_empty() {
            let requires: Vec<String> = topic
                .prerequisites
                .iter()
                .map(|id| {
                    names
                        .get(id)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("<missing {id}>"))
                })
                .collect();
            println!("    requires: {}", requires.join(", "));
        }
    }
    Ok(())
}
