//! CLI argument definitions for Syllabus.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "syllabus",
    version,
    about = "Plan what to study, in an order that respects prerequisites",
    long_about = "Syllabus keeps your topics of study and the prerequisites between them, \
                  and computes an order in which everything can be studied without \
                  starting a topic before its prerequisites."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Act on this owner's topics (defaults to `default-owner` in config, then $USER)
    #[arg(long, global = true, env = "SYLLABUS_OWNER")]
    pub owner: Option<String>,

    /// Path of the topic store file (defaults to `[store] path` in config)
    #[arg(long, global = true, env = "SYLLABUS_STORE")]
    pub store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List your topics
    #[command(alias = "ls")]
    List,

    /// Add a topic
    Add {
        /// Topic name (unique among your topics)
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// A prerequisite, by id or name (repeatable)
        #[arg(short, long = "requires", value_name = "TOPIC")]
        requires: Vec<String>,
    },

    /// Change a topic's name, description or prerequisites
    Edit {
        /// The topic to edit, by id or name
        topic: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(short, long)]
        description: Option<String>,
        /// Replace the prerequisites, by id or name (repeatable)
        #[arg(short, long = "requires", value_name = "TOPIC")]
        requires: Vec<String>,
        /// Remove all prerequisites
        #[arg(long, conflicts_with = "requires")]
        clear_requires: bool,
    },

    /// Remove a topic and drop it from other topics' prerequisites
    #[command(alias = "rm")]
    Remove {
        /// The topic to remove, by id or name
        topic: String,
    },

    /// Print the study order, or the topics caught in a prerequisite cycle
    Order {
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
