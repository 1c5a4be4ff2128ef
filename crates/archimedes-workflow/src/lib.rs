//! Archimedes Workflow
//!
//! This crate provides the "locked" plan representation for Archimedes.
//! A locked plan is a validated form of a [`PlanDef`](archimedes_config::PlanDef)
//! that is ready for execution.
//!
//! Key differences from `archimedes-config`:
//! - Every input key refers to the output of an earlier step
//! - Output keys are unique
//! - Web search is only requested by templates that can use it
//! - Dependency structure is available as a [`Graph`]

mod error;
mod graph;
mod plan;

pub use error::WorkflowError;
pub use graph::Graph;
pub use plan::{Plan, Step};
