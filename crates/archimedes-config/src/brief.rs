use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The free-text project description a run is launched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBrief(String);

impl ProjectBrief {
  pub fn new(text: impl Into<String>) -> Result<Self, ConfigError> {
    let text = text.into();
    let trimmed = text.trim();
    if trimmed.is_empty() {
      return Err(ConfigError::EmptyBrief);
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ProjectBrief {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Unit economics used by the financial projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialAssumptions {
  pub price_per_user_per_year: f64,
  pub cost_per_user_per_year: f64,
}

impl FinancialAssumptions {
  pub fn new(
    price_per_user_per_year: f64,
    cost_per_user_per_year: f64,
  ) -> Result<Self, ConfigError> {
    check_amount("price_per_user_per_year", price_per_user_per_year)?;
    check_amount("cost_per_user_per_year", cost_per_user_per_year)?;
    Ok(Self {
      price_per_user_per_year,
      cost_per_user_per_year,
    })
  }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ConfigError> {
  if value.is_finite() && value >= 0.0 {
    Ok(())
  } else {
    Err(ConfigError::InvalidAssumption { field, value })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_brief_is_trimmed() {
    let brief = ProjectBrief::new("  A mobile app for personalized workout plans \n").unwrap();
    assert_eq!(brief.as_str(), "A mobile app for personalized workout plans");
  }

  #[test]
  fn test_empty_brief_rejected() {
    assert!(matches!(
      ProjectBrief::new("   "),
      Err(ConfigError::EmptyBrief)
    ));
  }

  #[test]
  fn test_assumptions_accept_zero() {
    let a = FinancialAssumptions::new(0.0, 0.0).unwrap();
    assert_eq!(a.price_per_user_per_year, 0.0);
  }

  #[test]
  fn test_assumptions_reject_negative_and_nan() {
    let err = FinancialAssumptions::new(-1.0, 10.0).unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidAssumption {
        field: "price_per_user_per_year",
        ..
      }
    ));
    assert!(FinancialAssumptions::new(50.0, f64::NAN).is_err());
    assert!(FinancialAssumptions::new(f64::INFINITY, 1.0).is_err());
  }
}
