use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
  #[default]
  Idle,
  Running {
    step_index: usize,
  },
  Completed,
  Aborted {
    reason: AbortReason,
  },
}

/// Why a run stopped before its last step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
  /// A step failed under the abort policy.
  StepFailed { output_key: String, reason: String },
  /// The caller cancelled the run between steps.
  Cancelled,
  /// The engine could not continue.
  Error { message: String },
}

impl fmt::Display for AbortReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AbortReason::StepFailed { output_key, reason } => {
        write!(f, "step '{}' failed: {}", output_key, reason)
      }
      AbortReason::Cancelled => f.write_str("cancelled"),
      AbortReason::Error { message } => f.write_str(message),
    }
  }
}
