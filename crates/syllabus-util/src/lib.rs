//! Shared utilities for Syllabus.
//!
//! This crate provides the cross-cutting concerns used by the other Syllabus
//! crates: the unified error type and filesystem helpers for the data
//! directory and atomic store writes.

pub mod errors;
pub mod fs;
