//! Engine errors.
//!
//! These cover problems with the run itself. A step that fails is not an
//! error here: it is recorded as a [`StepResult::Failure`](crate::StepResult).

use archimedes_prompts::PromptError;
use archimedes_workflow::WorkflowError;

/// Errors that prevent a run from starting or continuing.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
  /// The plan violates an ordering invariant.
  #[error("invalid plan: {0}")]
  InvalidPlan(#[from] WorkflowError),

  /// The plan contains a financial step, but no assumptions were supplied.
  #[error("step '{step}' needs financial assumptions, but none were provided")]
  MissingAssumptions { step: String },

  /// The prompt templates could not be loaded.
  #[error("failed to load prompt catalog")]
  Catalog(#[source] PromptError),

  /// A second result for the same key in one run.
  #[error("result for '{key}' was already recorded in this run")]
  ResultAlreadyRecorded { key: String },
}

/// Errors at the session boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  /// A run is already in progress for this session.
  #[error("a run is already in progress for this session")]
  LaunchInProgress,

  /// `launch` was called outside a tokio runtime.
  #[error("no tokio runtime to run on: {message}")]
  NoRuntime { message: String },

  #[error(transparent)]
  Execution(#[from] ExecutionError),

  /// The run task panicked or was aborted.
  #[error("run task failed: {message}")]
  Join { message: String },
}
