use serde::{Deserialize, Serialize};

use crate::enums::TemplateId;

/// A single step of a plan, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  pub name: String,
  pub output_key: String,
  /// Output keys of earlier steps whose results feed this step's prompt.
  #[serde(default)]
  pub input_keys: Vec<String>,
  pub template: TemplateId,
  /// Run a web search for the brief before rendering the prompt.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub web_search: bool,
}

impl StepDef {
  /// A step named after its template, writing to the template's key.
  pub fn new(template: TemplateId) -> Self {
    Self {
      name: template.title().to_string(),
      output_key: template.as_str().to_string(),
      input_keys: Vec::new(),
      template,
      web_search: false,
    }
  }

  pub fn with_inputs<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.input_keys = keys.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_web_search(mut self) -> Self {
    self.web_search = true;
    self
  }
}
