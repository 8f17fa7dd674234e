//! Core data types for Syllabus.
//!
//! This crate defines what a study topic is, who owns it, and how topics are
//! persisted: the [`store::TopicStore`] interface with its in-memory and TOML
//! file backends, plus the global user configuration.
//!
//! Every topic belongs to exactly one owner. Stores partition their records
//! by owner and never return another owner's topics.

pub mod config;
pub mod store;
pub mod topic;

pub use topic::{NewTopic, OwnerId, Topic, TopicId, TopicPatch};
