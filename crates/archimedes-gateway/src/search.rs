//! Web-search gateway.

use std::fmt::Write as _;
use std::sync::Arc;

use archimedes_config::SearchSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::http::{build_client, read_success_body, transport_error};

const PROVIDER: &str = "Serper";

/// One keyword query in, a structured result set out.
#[async_trait]
pub trait SearchGateway: Send + Sync {
  async fn search(&self, query: &str) -> Result<SearchResults, GatewayError>;
}

/// Connect the search gateway described by `settings`.
///
/// Like [`connect_completion`](crate::connect_completion), this never fails;
/// a gateway without a credential reports the problem on each search.
pub fn connect_search(settings: &SearchSettings) -> Arc<dyn SearchGateway> {
  match SerperGateway::new(settings) {
    Ok(gateway) => Arc::new(gateway),
    Err(error) => {
      warn!(error = %error, "search gateway unavailable");
      Arc::new(UnavailableSearch::new(error))
    }
  }
}

/// A single organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub link: String,
  #[serde(default)]
  pub snippet: String,
}

/// The provider's response, kept as raw JSON with typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
  pub query: String,
  pub raw: serde_json::Value,
}

impl SearchResults {
  pub fn new(query: impl Into<String>, raw: serde_json::Value) -> Self {
    Self {
      query: query.into(),
      raw,
    }
  }

  /// Organic hits, skipping entries that do not parse.
  pub fn hits(&self) -> Vec<SearchHit> {
    self
      .raw
      .get("organic")
      .and_then(|v| v.as_array())
      .map(|items| {
        items
          .iter()
          .filter_map(|item| serde_json::from_value(item.clone()).ok())
          .collect()
      })
      .unwrap_or_default()
  }

  /// The direct answer, when the provider returned one.
  pub fn answer(&self) -> Option<String> {
    let answer_box = self.raw.get("answerBox")?;
    answer_box
      .get("answer")
      .or_else(|| answer_box.get("snippet"))
      .and_then(|v| v.as_str())
      .map(str::to_string)
  }

  /// Format the results as a text block for a prompt.
  pub fn to_context(&self) -> String {
    let hits = self.hits();
    let mut out = String::new();

    if let Some(answer) = self.answer() {
      let _ = writeln!(out, "Answer: {}", answer);
      out.push('\n');
    }

    if hits.is_empty() {
      let _ = write!(out, "No results found for \"{}\".", self.query);
      return out;
    }

    for (i, hit) in hits.iter().enumerate() {
      let _ = writeln!(out, "{}. {}", i + 1, hit.title);
      if !hit.link.is_empty() {
        let _ = writeln!(out, "   Source: {}", hit.link);
      }
      if !hit.snippet.is_empty() {
        let _ = writeln!(out, "   {}", hit.snippet);
      }
    }
    out.trim_end().to_string()
  }
}

/// Google search through the Serper API.
pub struct SerperGateway {
  client: Client,
  endpoint: String,
  api_key: String,
  num_results: u32,
}

impl SerperGateway {
  pub fn new(settings: &SearchSettings) -> Result<Self, GatewayError> {
    let api_key = settings
      .api_key
      .clone()
      .ok_or(GatewayError::MissingCredential {
        provider: PROVIDER,
        env_var: settings.api_key_env,
      })?;

    Ok(Self {
      client: build_client(PROVIDER, settings.timeout)?,
      endpoint: format!("{}/search", settings.base_url),
      api_key,
      num_results: settings.num_results,
    })
  }
}

#[async_trait]
impl SearchGateway for SerperGateway {
  async fn search(&self, query: &str) -> Result<SearchResults, GatewayError> {
    debug!(query = %query, endpoint = %self.endpoint, "sending web search");

    let response = self
      .client
      .post(&self.endpoint)
      .header("X-API-KEY", &self.api_key)
      .json(&json!({ "q": query, "num": self.num_results }))
      .send()
      .await
      .map_err(|e| transport_error(PROVIDER, e))?;

    let body = read_success_body(PROVIDER, response).await?;
    let raw: serde_json::Value =
      serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse {
        provider: PROVIDER,
        message: e.to_string(),
      })?;

    Ok(SearchResults::new(query, raw))
  }
}

/// Stand-in for a search gateway that could not be constructed.
#[derive(Debug, Clone)]
pub struct UnavailableSearch {
  error: GatewayError,
}

impl UnavailableSearch {
  pub fn new(error: GatewayError) -> Self {
    Self { error }
  }
}

#[async_trait]
impl SearchGateway for UnavailableSearch {
  async fn search(&self, _query: &str) -> Result<SearchResults, GatewayError> {
    Err(self.error.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> SearchResults {
    SearchResults::new(
      "fitness app market",
      json!({
        "answerBox": { "snippet": "The fitness app market was valued at $10B." },
        "organic": [
          { "title": "Fitness App Market Report", "link": "https://example.com/report", "snippet": "Growing 17% a year." },
          { "title": "Top Workout Apps", "link": "https://example.com/top" },
          "not an object"
        ]
      }),
    )
  }

  #[test]
  fn test_hits_skip_malformed_entries() {
    let hits = sample().hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[1].snippet, "");
  }

  #[test]
  fn test_to_context() {
    let context = sample().to_context();
    assert!(context.starts_with("Answer: The fitness app market was valued at $10B."));
    assert!(context.contains("1. Fitness App Market Report\n   Source: https://example.com/report\n   Growing 17% a year."));
    assert!(context.contains("2. Top Workout Apps"));
  }

  #[test]
  fn test_to_context_without_hits() {
    let results = SearchResults::new("nothing", json!({ "organic": [] }));
    assert_eq!(results.to_context(), "No results found for \"nothing\".");
  }
}
