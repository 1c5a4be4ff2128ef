//! Step results and the per-run results store.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// What one step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum StepResult {
  /// Generated text.
  Success(String),
  /// A short, human-readable diagnostic.
  Failure(String),
}

impl StepResult {
  pub fn is_success(&self) -> bool {
    matches!(self, StepResult::Success(_))
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, StepResult::Failure(_))
  }

  /// The generated text, if the step succeeded.
  pub fn success(&self) -> Option<&str> {
    match self {
      StepResult::Success(text) => Some(text),
      StepResult::Failure(_) => None,
    }
  }

  /// The diagnostic, if the step failed.
  pub fn failure(&self) -> Option<&str> {
    match self {
      StepResult::Success(_) => None,
      StepResult::Failure(reason) => Some(reason),
    }
  }
}

impl fmt::Display for StepResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StepResult::Success(text) => f.write_str(text),
      StepResult::Failure(reason) => write!(f, "Error: {}", reason),
    }
  }
}

/// Output key → result, in the order steps finished.
///
/// Scoped to one run. A key is written at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsStore {
  entries: IndexMap<String, StepResult>,
}

impl ResultsStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a step's result. Fails if the key already has one.
  pub fn record(&mut self, key: &str, result: StepResult) -> Result<(), ExecutionError> {
    if self.entries.contains_key(key) {
      return Err(ExecutionError::ResultAlreadyRecorded {
        key: key.to_string(),
      });
    }
    self.entries.insert(key.to_string(), result);
    Ok(())
  }

  pub fn get(&self, key: &str) -> Option<&StepResult> {
    self.entries.get(key)
  }

  /// Text of a successful result.
  pub fn success(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(StepResult::success)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StepResult)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Number of failed entries.
  pub fn failures(&self) -> usize {
    self.entries.values().filter(|r| r.is_failure()).count()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_and_get() {
    let mut store = ResultsStore::new();
    store
      .record("branding", StepResult::Success("Names".into()))
      .unwrap();
    store
      .record("tech_stack", StepResult::Failure("timeout".into()))
      .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.success("branding"), Some("Names"));
    assert_eq!(store.success("tech_stack"), None);
    assert_eq!(store.get("tech_stack").and_then(StepResult::failure), Some("timeout"));
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["branding", "tech_stack"]);
    assert_eq!(store.failures(), 1);
  }

  #[test]
  fn test_record_never_overwrites() {
    let mut store = ResultsStore::new();
    store.record("x", StepResult::Success("first".into())).unwrap();

    let err = store
      .record("x", StepResult::Success("second".into()))
      .unwrap_err();
    assert!(matches!(err, ExecutionError::ResultAlreadyRecorded { key } if key == "x"));
    assert_eq!(store.success("x"), Some("first"));
  }

  #[test]
  fn test_failure_display_is_marked() {
    assert_eq!(StepResult::Success("hi".into()).to_string(), "hi");
    assert_eq!(
      StepResult::Failure("no key".into()).to_string(),
      "Error: no key"
    );
  }

  #[test]
  fn test_serde_shape() {
    let json = serde_json::to_value(StepResult::Failure("boom".into())).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "failure", "text": "boom" }));
  }
}
