use archimedes_config::TemplateId;
use thiserror::Error;

/// Plan construction errors. These are configuration mistakes, detected
/// before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("plan '{plan}' has no steps")]
  EmptyPlan { plan: String },

  #[error("output key '{key}' is produced by more than one step (step {first} and step {second})")]
  DuplicateOutputKey {
    key: String,
    first: usize,
    second: usize,
  },

  #[error("step '{step}' depends on its own output '{key}'")]
  SelfReference { step: String, key: String },

  #[error("step '{step}' depends on '{key}', which is only produced later by step {producer}")]
  ForwardReference {
    step: String,
    key: String,
    producer: usize,
  },

  #[error("step '{step}' depends on '{key}', which no step produces")]
  UnknownInput { step: String, key: String },

  #[error("step '{step}' requests web search, but template '{template}' cannot use it")]
  SearchNotSupported { step: String, template: TemplateId },
}
