//! Fake gateways shared by the engine and session tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use archimedes_config::{FailurePolicy, FinancialAssumptions, PlanDef, ProjectBrief, StepDef};
use archimedes_gateway::{CompletionGateway, GatewayError, SearchGateway, SearchResults};
use archimedes_workflow::Plan;
use async_trait::async_trait;
use serde_json::json;

/// A recorded completion request.
#[derive(Debug, Clone)]
pub struct Call {
  pub system: String,
  pub user: String,
}

type Hook = Box<dyn Fn(usize) + Send + Sync>;

/// Completion gateway that records calls and replays a script.
///
/// Once the script runs out, call `n` (1-based) answers `"completion n"`.
#[derive(Default)]
pub struct FakeCompletion {
  calls: Mutex<Vec<Call>>,
  script: Mutex<VecDeque<Result<String, GatewayError>>>,
  delay: Option<Duration>,
  on_call: Option<Hook>,
}

impl FakeCompletion {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(self, text: &str) -> Self {
    self.push(Ok(text.to_string()))
  }

  pub fn fail(self, error: GatewayError) -> Self {
    self.push(Err(error))
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  /// Run `hook` with the call number when a call arrives.
  pub fn on_call(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
    self.on_call = Some(Box::new(hook));
    self
  }

  fn push(self, reply: Result<String, GatewayError>) -> Self {
    self.script.lock().unwrap().push_back(reply);
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl CompletionGateway for FakeCompletion {
  async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError> {
    let n = {
      let mut calls = self.calls.lock().unwrap();
      calls.push(Call {
        system: system.to_string(),
        user: user.to_string(),
      });
      calls.len()
    };

    if let Some(hook) = &self.on_call {
      hook(n);
    }
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    let scripted = self.script.lock().unwrap().pop_front();
    scripted.unwrap_or_else(|| Ok(format!("completion {}", n)))
  }
}

/// Search gateway that records queries and either answers or fails.
pub struct FakeSearch {
  queries: Mutex<Vec<String>>,
  error: Option<GatewayError>,
}

impl FakeSearch {
  pub fn ok() -> Self {
    Self {
      queries: Mutex::new(Vec::new()),
      error: None,
    }
  }

  pub fn failing(error: GatewayError) -> Self {
    Self {
      queries: Mutex::new(Vec::new()),
      error: Some(error),
    }
  }

  pub fn queries(&self) -> Vec<String> {
    self.queries.lock().unwrap().clone()
  }
}

#[async_trait]
impl SearchGateway for FakeSearch {
  async fn search(&self, query: &str) -> Result<SearchResults, GatewayError> {
    self.queries.lock().unwrap().push(query.to_string());
    match &self.error {
      Some(error) => Err(error.clone()),
      None => Ok(SearchResults::new(
        query,
        json!({
          "organic": [{
            "title": "Tutoring market report",
            "link": "https://example.com/report",
            "snippet": "The online tutoring market keeps growing."
          }]
        }),
      )),
    }
  }
}

pub fn brief() -> ProjectBrief {
  ProjectBrief::new("An AI tutor that helps kids learn math").unwrap()
}

pub fn assumptions() -> FinancialAssumptions {
  FinancialAssumptions::new(50.0, 10.0).unwrap()
}

pub fn plan(steps: Vec<StepDef>) -> Plan {
  plan_with_policy(steps, FailurePolicy::default())
}

pub fn plan_with_policy(steps: Vec<StepDef>, failure_policy: FailurePolicy) -> Plan {
  Plan::lock(PlanDef {
    name: "test".to_string(),
    steps,
    failure_policy,
  })
  .unwrap()
}

pub fn transport_error() -> GatewayError {
  GatewayError::Transport {
    provider: "Mistral",
    message: "connection refused".to_string(),
    timed_out: false,
  }
}
