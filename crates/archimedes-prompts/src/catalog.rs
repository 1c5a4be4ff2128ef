use archimedes_config::{FinancialAssumptions, ProjectBrief, TemplateId};
use minijinja::{Environment, UndefinedBehavior, Value, context};
use serde::{Deserialize, Serialize};

use crate::error::PromptError;
use crate::finance::{
  PENETRATION_SCHEDULE, extract_som, format_money, format_rate, group_thousands, project,
};
use crate::templates;

/// A rendered (system, user) instruction pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
  pub system: String,
  pub user: String,
}

/// An upstream output handed to a prompt, in the order the step declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
  pub key: String,
  pub text: String,
}

impl ResolvedInput {
  pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      text: text.into(),
    }
  }
}

/// Outcome of the web search that precedes a research step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SearchContext {
  /// Formatted search results to ground the prompt in.
  Results(String),
  /// The search failed or is not configured; the diagnostic is kept for
  /// reporting but never rendered into the prompt.
  Unavailable(String),
}

/// Everything a template can draw on.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
  pub brief: &'a ProjectBrief,
  pub inputs: &'a [ResolvedInput],
  pub search: Option<&'a SearchContext>,
  pub assumptions: Option<&'a FinancialAssumptions>,
}

impl<'a> PromptContext<'a> {
  pub fn new(brief: &'a ProjectBrief) -> Self {
    Self {
      brief,
      inputs: &[],
      search: None,
      assumptions: None,
    }
  }

  pub fn with_inputs(mut self, inputs: &'a [ResolvedInput]) -> Self {
    self.inputs = inputs;
    self
  }

  pub fn with_search(mut self, search: &'a SearchContext) -> Self {
    self.search = Some(search);
    self
  }

  pub fn with_assumptions(mut self, assumptions: &'a FinancialAssumptions) -> Self {
    self.assumptions = Some(assumptions);
    self
  }
}

/// Template values for the financial projection.
#[derive(Debug, Serialize)]
struct FinanceView {
  schedule: String,
  price: String,
  cost: String,
  som: Option<String>,
  table: Option<String>,
}

impl FinanceView {
  fn build(inputs: &[ResolvedInput], assumptions: &FinancialAssumptions) -> Self {
    let som = inputs.iter().find_map(|input| extract_som(&input.text));
    let projection = som.map(|som| project(som, assumptions));

    Self {
      schedule: PENETRATION_SCHEDULE
        .iter()
        .map(|&r| format_rate(r))
        .collect::<Vec<_>>()
        .join(" / "),
      price: format_money(assumptions.price_per_user_per_year),
      cost: format_money(assumptions.cost_per_user_per_year),
      som: som.map(group_thousands),
      table: projection.map(|p| p.to_markdown()),
    }
  }
}

/// The fixed set of prompt templates.
pub struct PromptCatalog {
  env: Environment<'static>,
}

impl PromptCatalog {
  pub fn new() -> Result<Self, PromptError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);

    let (name, source) = templates::INPUTS;
    add_template(&mut env, name, source)?;
    for template in TemplateId::ALL {
      for (name, source) in templates::sources(template) {
        add_template(&mut env, name, source)?;
      }
    }

    Ok(Self { env })
  }

  /// Render the system and user instructions for `template`.
  pub fn render(
    &self,
    template: TemplateId,
    ctx: &PromptContext<'_>,
  ) -> Result<Prompt, PromptError> {
    let finance = match template {
      TemplateId::FinancialProjection => {
        let assumptions = ctx
          .assumptions
          .ok_or(PromptError::MissingAssumptions(template))?;
        Some(FinanceView::build(ctx.inputs, assumptions))
      }
      _ => None,
    };

    let (search_results, search_unavailable) = match ctx.search {
      Some(SearchContext::Results(blob)) => (Some(blob.as_str()), false),
      Some(SearchContext::Unavailable(_)) => (None, true),
      None => (None, false),
    };

    let values = context! {
      brief => ctx.brief.as_str(),
      inputs => ctx.inputs,
      search_results => search_results,
      search_unavailable => search_unavailable,
      finance => finance,
    };

    let [(system_name, _), (user_name, _)] = templates::sources(template);
    let system = self.render_one(system_name, &values)?;
    let user = self.render_one(user_name, &values)?;

    if system.is_empty() {
      return Err(PromptError::EmptyRender {
        template,
        part: "system",
      });
    }
    if user.is_empty() {
      return Err(PromptError::EmptyRender {
        template,
        part: "user",
      });
    }

    Ok(Prompt { system, user })
  }

  fn render_one(&self, name: &str, values: &Value) -> Result<String, PromptError> {
    self
      .env
      .get_template(name)
      .and_then(|t| t.render(values))
      .map(|s| s.trim().to_string())
      .map_err(|source| PromptError::Render {
        name: name.to_string(),
        source,
      })
  }
}

fn add_template(
  env: &mut Environment<'static>,
  name: &'static str,
  source: &'static str,
) -> Result<(), PromptError> {
  env
    .add_template(name, source)
    .map_err(|source| PromptError::Load {
      name: name.to_string(),
      source,
    })
}
