use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::{FailurePolicy, TemplateId};
use crate::error::ConfigError;
use crate::step::StepDef;

/// An ordered plan of steps, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDef {
  pub name: String,
  pub steps: Vec<StepDef>,
  #[serde(default)]
  pub failure_policy: FailurePolicy,
}

impl PlanDef {
  /// The full seven-step founder plan.
  ///
  /// Research is grounded in a web search; the financial projection reads the
  /// SOM figure out of the research; the pitch deck synthesizes everything.
  pub fn standard() -> Self {
    Self {
      name: "founder-kit".to_string(),
      steps: vec![
        StepDef::new(TemplateId::MarketResearch).with_web_search(),
        StepDef::new(TemplateId::CompetitorAnalysis),
        StepDef::new(TemplateId::Branding),
        StepDef::new(TemplateId::TechStack),
        StepDef::new(TemplateId::FinancialProjection).with_inputs(["market_research"]),
        StepDef::new(TemplateId::OutreachEmail).with_inputs(["branding"]),
        StepDef::new(TemplateId::PitchDeck).with_inputs([
          "market_research",
          "competitor_analysis",
          "branding",
          "financial_projection",
        ]),
      ],
      failure_policy: FailurePolicy::default(),
    }
  }

  /// Load a plan from a JSON file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadPlan {
      path: path.display().to_string(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ParsePlan {
      path: path.display().to_string(),
      source,
    })
  }

  pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
    self.failure_policy = policy;
    self
  }

  /// Whether any step renders the given template.
  pub fn uses_template(&self, template: TemplateId) -> bool {
    self.steps.iter().any(|s| s.template == template)
  }
}
