//! Archimedes Config
//!
//! This crate contains the serializable configuration types for Archimedes.
//! These types describe a plan before it is locked by `archimedes-workflow`
//! and executed by the engine.
//!
//! Configuration comes from:
//! - JSON plan files (via CLI with `--plan=plan.json`)
//! - The built-in [`PlanDef::standard`] plan
//! - Environment variables (and an optional `.env` file) for provider settings

mod brief;
mod enums;
mod error;
mod plan;
mod settings;
mod step;

pub use brief::{FinancialAssumptions, ProjectBrief};
pub use enums::{FailurePolicy, TemplateId};
pub use error::ConfigError;
pub use plan::PlanDef;
pub use settings::{CompletionSettings, SearchSettings, Settings};
pub use step::StepDef;
