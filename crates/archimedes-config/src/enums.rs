use std::fmt;

use serde::{Deserialize, Serialize};

/// The prompt template a step renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
  MarketResearch,
  CompetitorAnalysis,
  Branding,
  TechStack,
  FinancialProjection,
  OutreachEmail,
  PitchDeck,
}

impl TemplateId {
  pub const ALL: [TemplateId; 7] = [
    TemplateId::MarketResearch,
    TemplateId::CompetitorAnalysis,
    TemplateId::Branding,
    TemplateId::TechStack,
    TemplateId::FinancialProjection,
    TemplateId::OutreachEmail,
    TemplateId::PitchDeck,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      TemplateId::MarketResearch => "market_research",
      TemplateId::CompetitorAnalysis => "competitor_analysis",
      TemplateId::Branding => "branding",
      TemplateId::TechStack => "tech_stack",
      TemplateId::FinancialProjection => "financial_projection",
      TemplateId::OutreachEmail => "outreach_email",
      TemplateId::PitchDeck => "pitch_deck",
    }
  }

  /// Human-readable title, used for section headings.
  pub fn title(&self) -> &'static str {
    match self {
      TemplateId::MarketResearch => "Market Research",
      TemplateId::CompetitorAnalysis => "Competitor Analysis",
      TemplateId::Branding => "Branding",
      TemplateId::TechStack => "Tech Stack",
      TemplateId::FinancialProjection => "Financial Projection",
      TemplateId::OutreachEmail => "Outreach Email",
      TemplateId::PitchDeck => "Pitch Deck",
    }
  }

  /// Whether the template can take live web-search results as extra context.
  pub fn supports_web_search(&self) -> bool {
    matches!(self, TemplateId::MarketResearch)
  }
}

impl fmt::Display for TemplateId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What the engine does when a step produces a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Stop the run at the first failed step.
  #[default]
  Abort,
  /// Record the failure, keep running independent steps, and fail any step
  /// that consumes a failed output without calling the model.
  SkipDependents,
  /// Record the failure and hand its diagnostic text to dependent steps as if
  /// it were content.
  ForwardFailures,
}
