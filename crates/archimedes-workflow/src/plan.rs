use std::collections::HashMap;

use archimedes_config::{FailurePolicy, PlanDef, StepDef, TemplateId};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::graph::Graph;

/// A validated step, with its position in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub index: usize,
  pub name: String,
  pub output_key: String,
  pub input_keys: Vec<String>,
  pub template: TemplateId,
  pub web_search: bool,
}

/// A locked plan ready for execution.
///
/// Can only be built through [`Plan::lock`], so holding a `Plan` means the
/// ordering invariant holds: every input key is the output of an earlier step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
  name: String,
  steps: Vec<Step>,
  failure_policy: FailurePolicy,
}

impl Plan {
  /// Validate a plan definition and lock it.
  pub fn lock(def: PlanDef) -> Result<Self, WorkflowError> {
    validate_steps(&def.name, &def.steps)?;

    let steps = def
      .steps
      .into_iter()
      .enumerate()
      .map(|(index, s)| Step {
        index,
        name: s.name,
        output_key: s.output_key,
        input_keys: s.input_keys,
        template: s.template,
        web_search: s.web_search,
      })
      .collect();

    Ok(Self {
      name: def.name,
      steps,
      failure_policy: def.failure_policy,
    })
  }

  /// Re-check the ordering invariant.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    let defs: Vec<StepDef> = self
      .steps
      .iter()
      .map(|s| StepDef {
        name: s.name.clone(),
        output_key: s.output_key.clone(),
        input_keys: s.input_keys.clone(),
        template: s.template,
        web_search: s.web_search,
      })
      .collect();
    validate_steps(&self.name, &defs)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn failure_policy(&self) -> FailurePolicy {
    self.failure_policy
  }

  /// Look up a step by its output key.
  pub fn get_step(&self, output_key: &str) -> Option<&Step> {
    self.steps.iter().find(|s| s.output_key == output_key)
  }

  pub fn uses_template(&self, template: TemplateId) -> bool {
    self.steps.iter().any(|s| s.template == template)
  }

  /// Build the dependency graph.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.steps)
  }
}

impl TryFrom<PlanDef> for Plan {
  type Error = WorkflowError;

  fn try_from(def: PlanDef) -> Result<Self, Self::Error> {
    Plan::lock(def)
  }
}

fn validate_steps(plan: &str, steps: &[StepDef]) -> Result<(), WorkflowError> {
  if steps.is_empty() {
    return Err(WorkflowError::EmptyPlan {
      plan: plan.to_string(),
    });
  }

  // Producer index for every output key, catching duplicates.
  let mut producers: HashMap<&str, usize> = HashMap::new();
  for (index, step) in steps.iter().enumerate() {
    if let Some(first) = producers.insert(step.output_key.as_str(), index) {
      return Err(WorkflowError::DuplicateOutputKey {
        key: step.output_key.clone(),
        first,
        second: index,
      });
    }
  }

  for (index, step) in steps.iter().enumerate() {
    if step.web_search && !step.template.supports_web_search() {
      return Err(WorkflowError::SearchNotSupported {
        step: step.name.clone(),
        template: step.template,
      });
    }

    for key in &step.input_keys {
      match producers.get(key.as_str()) {
        Some(&producer) if producer < index => {}
        Some(&producer) if producer == index => {
          return Err(WorkflowError::SelfReference {
            step: step.name.clone(),
            key: key.clone(),
          });
        }
        Some(&producer) => {
          return Err(WorkflowError::ForwardReference {
            step: step.name.clone(),
            key: key.clone(),
            producer,
          });
        }
        None => {
          return Err(WorkflowError::UnknownInput {
            step: step.name.clone(),
            key: key.clone(),
          });
        }
      }
    }
  }

  Ok(())
}
