//! Prompt catalog for Archimedes.
//!
//! Each [`TemplateId`](archimedes_config::TemplateId) maps to a pair of
//! minijinja templates: a system instruction with a fixed section outline, and
//! a user instruction carrying the brief and upstream outputs. Rendering is a
//! pure function of the [`PromptContext`].
//!
//! # Usage
//!
//! ```ignore
//! let catalog = PromptCatalog::new()?;
//! let prompt = catalog.render(TemplateId::Branding, &PromptContext::new(&brief))?;
//! gateway.complete(&prompt.system, &prompt.user).await?;
//! ```

mod catalog;
mod error;
mod finance;
mod templates;

pub use catalog::{Prompt, PromptCatalog, PromptContext, ResolvedInput, SearchContext};
pub use error::PromptError;
pub use finance::{
  MIN_BARE_SOM, PENETRATION_SCHEDULE, Projection, YearProjection, extract_som, project,
};
