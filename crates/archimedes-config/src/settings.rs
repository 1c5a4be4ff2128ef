//! Provider settings loaded from the environment.
//!
//! Credentials are optional here: a missing key is not a configuration error
//! at load time. Gateways decide what a missing credential means when they are
//! constructed.

use std::time::Duration;

use crate::error::ConfigError;

pub const MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";

const DEFAULT_MODEL: &str = "mistral-small-latest";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";
const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_RESULTS: u32 = 8;

/// Settings for the text-completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
  /// Name of the variable the key was read from, for diagnostics.
  pub api_key_env: &'static str,
  pub api_key: Option<String>,
  pub model: String,
  pub temperature: f32,
  pub base_url: String,
  pub timeout: Duration,
}

/// Settings for the web-search provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
  pub api_key_env: &'static str,
  pub api_key: Option<String>,
  pub base_url: String,
  pub num_results: u32,
  pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub completion: CompletionSettings,
  pub search: SearchSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      completion: CompletionSettings {
        api_key_env: MISTRAL_API_KEY,
        api_key: None,
        model: DEFAULT_MODEL.to_string(),
        temperature: DEFAULT_TEMPERATURE,
        base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
        timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
      },
      search: SearchSettings {
        api_key_env: SERPER_API_KEY,
        api_key: None,
        base_url: DEFAULT_SERPER_BASE_URL.to_string(),
        num_results: DEFAULT_SEARCH_RESULTS,
        timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
      },
    }
  }
}

impl Settings {
  /// Load settings from the process environment, reading `.env` first if present.
  pub fn from_env() -> Result<Self, ConfigError> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Load settings through an arbitrary variable lookup.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut settings = Self::default();

    settings.completion.api_key = get(MISTRAL_API_KEY);
    if let Some(model) = get("ARCHIMEDES_MODEL") {
      settings.completion.model = model;
    }
    if let Some(raw) = get("ARCHIMEDES_TEMPERATURE") {
      settings.completion.temperature = parse_temperature(&raw)?;
    }
    if let Some(url) = get("MISTRAL_BASE_URL") {
      settings.completion.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(raw) = get("ARCHIMEDES_COMPLETION_TIMEOUT_SECS") {
      settings.completion.timeout = parse_secs("ARCHIMEDES_COMPLETION_TIMEOUT_SECS", &raw)?;
    }

    settings.search.api_key = get(SERPER_API_KEY);
    if let Some(url) = get("SERPER_BASE_URL") {
      settings.search.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(raw) = get("ARCHIMEDES_SEARCH_TIMEOUT_SECS") {
      settings.search.timeout = parse_secs("ARCHIMEDES_SEARCH_TIMEOUT_SECS", &raw)?;
    }

    Ok(settings)
  }
}

fn parse_temperature(raw: &str) -> Result<f32, ConfigError> {
  let value: f32 = raw
    .trim()
    .parse()
    .map_err(|e: std::num::ParseFloatError| ConfigError::InvalidSetting {
      var: "ARCHIMEDES_TEMPERATURE",
      value: raw.to_string(),
      message: e.to_string(),
    })?;
  if !(0.0..=2.0).contains(&value) {
    return Err(ConfigError::InvalidSetting {
      var: "ARCHIMEDES_TEMPERATURE",
      value: raw.to_string(),
      message: "must be between 0.0 and 2.0".to_string(),
    });
  }
  Ok(value)
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
  match raw.trim().parse::<u64>() {
    Ok(0) => Err(ConfigError::InvalidSetting {
      var,
      value: raw.to_string(),
      message: "must be greater than zero".to_string(),
    }),
    Ok(secs) => Ok(Duration::from_secs(secs)),
    Err(e) => Err(ConfigError::InvalidSetting {
      var,
      value: raw.to_string(),
      message: e.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn test_defaults_without_variables() {
    let settings = Settings::from_lookup(lookup(&[])).unwrap();
    assert_eq!(settings, Settings::default());
    assert!(settings.completion.api_key.is_none());
    assert_eq!(settings.completion.model, "mistral-small-latest");
    assert_eq!(settings.completion.temperature, 0.7);
  }

  #[test]
  fn test_reads_credentials_and_overrides() {
    let settings = Settings::from_lookup(lookup(&[
      ("MISTRAL_API_KEY", "mk-123"),
      ("SERPER_API_KEY", "sk-456"),
      ("ARCHIMEDES_MODEL", "mistral-large-latest"),
      ("ARCHIMEDES_TEMPERATURE", "0.2"),
      ("MISTRAL_BASE_URL", "http://localhost:9000/"),
      ("ARCHIMEDES_SEARCH_TIMEOUT_SECS", "5"),
    ]))
    .unwrap();

    assert_eq!(settings.completion.api_key.as_deref(), Some("mk-123"));
    assert_eq!(settings.search.api_key.as_deref(), Some("sk-456"));
    assert_eq!(settings.completion.model, "mistral-large-latest");
    assert_eq!(settings.completion.temperature, 0.2);
    assert_eq!(settings.completion.base_url, "http://localhost:9000");
    assert_eq!(settings.search.timeout, Duration::from_secs(5));
  }

  #[test]
  fn test_blank_key_counts_as_missing() {
    let settings = Settings::from_lookup(lookup(&[("MISTRAL_API_KEY", "  ")])).unwrap();
    assert!(settings.completion.api_key.is_none());
  }

  #[test]
  fn test_invalid_numbers_rejected() {
    let err = Settings::from_lookup(lookup(&[("ARCHIMEDES_TEMPERATURE", "hot")])).unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidSetting {
        var: "ARCHIMEDES_TEMPERATURE",
        ..
      }
    ));

    let err = Settings::from_lookup(lookup(&[("ARCHIMEDES_TEMPERATURE", "3.5")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { .. }));

    let err =
      Settings::from_lookup(lookup(&[("ARCHIMEDES_COMPLETION_TIMEOUT_SECS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting { .. }));
  }
}
