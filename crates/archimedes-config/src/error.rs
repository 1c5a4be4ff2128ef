use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("project brief is empty")]
  EmptyBrief,

  #[error("invalid financial assumption '{field}': {value} (must be a finite, non-negative number)")]
  InvalidAssumption { field: &'static str, value: f64 },

  #[error("invalid value for {var}: '{value}' ({message})")]
  InvalidSetting {
    var: &'static str,
    value: String,
    message: String,
  },

  #[error("failed to read plan file {path}")]
  ReadPlan {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse plan file {path}")]
  ParsePlan {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}
