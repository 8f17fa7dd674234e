//! Prerequisite graph engine.
//!
//! Turns one owner's topics into a subject graph, orders it with a
//! deterministic Kahn sort, reports cycles, validates topic mutations, and
//! ties these together against a [`syllabus_core::store::TopicStore`] in
//! [`service::PrerequisiteGraphService`].

pub mod cycle;
pub mod graph;
pub mod order;
pub mod service;
pub mod sort;
pub mod validate;

pub use graph::{DanglingPrerequisite, SubjectGraph};
pub use order::{compute_order, StudyOrder};
pub use service::{PrerequisiteGraphService, ServiceError};
pub use syllabus_core::config::CyclePolicy;
pub use validate::{MutationValidator, ValidationError};
