//! Handler for `syllabus order`.

use console::style;
use miette::Result;

use syllabus_util::errors::SyllabusError;

use super::Session;

pub async fn exec(session: &Session, json: bool) -> Result<()> {
    let result = session
        .service
        .compute_order(&session.owner)
        .await
        .map_err(SyllabusError::from)?;

    if json {
        let out = serde_json::to_string_pretty(&result).map_err(|e| SyllabusError::Generic {
            message: format!("Failed to encode result: {e}"),
        })?;
        println!("{out}");
        return Ok(());
    }

    for dangling in &result.dangling {
        eprintln!("{} {dangling}", style("warning:").yellow().bold());
    }

    if result.has_cycle {
        println!("{}", style(&result.message).red().bold());
        print!("{}", result.cycle_report());
        return Ok(());
    }

    if result.order.is_empty() {
        println!("No topics yet.");
        return Ok(());
    }

    println!("{}", style("Study order:").bold());
    let width = result.order.len().to_string().len();
    for (i, topic) in result.order.iter().enumerate() {
        println!("  {:>width$}. {}", i + 1, topic.name);
    }
    Ok(())
}
