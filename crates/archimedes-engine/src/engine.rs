//! Workflow execution engine.
//!
//! The `WorkflowEngine` runs the steps of a locked plan strictly in order.
//! Each step resolves its inputs from the run's results store, optionally
//! searches the web, renders its prompt and calls the completion gateway.
//! The step's result is recorded before the next step starts.

use std::sync::Arc;

use archimedes_config::{FailurePolicy, FinancialAssumptions, ProjectBrief, TemplateId};
use archimedes_gateway::{CompletionGateway, SearchGateway};
use archimedes_prompts::{PromptCatalog, PromptContext, ResolvedInput, SearchContext};
use archimedes_workflow::{Plan, Step};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{ResultsStore, StepResult};
use crate::state::{AbortReason, RunState};

/// What happened to one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
  pub index: usize,
  pub output_key: String,
  pub template: TemplateId,
  /// Inputs handed to the prompt, in declared order. Empty when input
  /// resolution failed.
  pub inputs: Vec<ResolvedInput>,
  /// Outcome of the pre-step web search, if the step asked for one.
  pub search: Option<SearchContext>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  /// Whether the completion gateway was called.
  pub dispatched: bool,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
  pub run_id: String,
  pub state: RunState,
  pub store: ResultsStore,
  pub trace: Vec<StepRecord>,
}

impl RunOutcome {
  pub fn is_completed(&self) -> bool {
    self.state == RunState::Completed
  }
}

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `WorkflowEngine::new()` for an engine with no-op notifications,
/// or `WorkflowEngine::with_notifier()` to provide a custom notifier.
pub struct WorkflowEngine<N: ExecutionNotifier = NoopNotifier> {
  completion: Arc<dyn CompletionGateway>,
  search: Option<Arc<dyn SearchGateway>>,
  catalog: PromptCatalog,
  notifier: N,
}

impl WorkflowEngine<NoopNotifier> {
  /// Create a new workflow engine with no-op notifications.
  ///
  /// Events are discarded. Use `with_notifier` if you need to observe events.
  pub fn new(
    completion: Arc<dyn CompletionGateway>,
    search: Option<Arc<dyn SearchGateway>>,
  ) -> Result<Self, ExecutionError> {
    Self::with_notifier(completion, search, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowEngine<N> {
  /// Create a new workflow engine with a custom notifier.
  ///
  /// Without a search gateway, steps that ask for web search proceed as if
  /// the search had failed.
  pub fn with_notifier(
    completion: Arc<dyn CompletionGateway>,
    search: Option<Arc<dyn SearchGateway>>,
    notifier: N,
  ) -> Result<Self, ExecutionError> {
    let catalog = PromptCatalog::new().map_err(ExecutionError::Catalog)?;

    Ok(Self {
      completion,
      search,
      catalog,
      notifier,
    })
  }

  /// Check that `plan` can run with the given assumptions.
  pub fn preflight(
    &self,
    plan: &Plan,
    assumptions: Option<&FinancialAssumptions>,
  ) -> Result<(), ExecutionError> {
    plan.validate()?;

    if assumptions.is_some() {
      return Ok(());
    }

    match plan
      .steps()
      .iter()
      .find(|s| s.template == TemplateId::FinancialProjection)
    {
      Some(step) => Err(ExecutionError::MissingAssumptions {
        step: step.output_key.clone(),
      }),
      None => Ok(()),
    }
  }

  /// Execute every step of `plan` for `brief`.
  ///
  /// Step failures do not make this return `Err`; they are recorded in the
  /// outcome's store and handled according to the plan's failure policy.
  pub async fn execute(
    &self,
    plan: &Plan,
    brief: &ProjectBrief,
    assumptions: Option<&FinancialAssumptions>,
    cancel: CancellationToken,
  ) -> Result<RunOutcome, ExecutionError> {
    let run_id = uuid::Uuid::new_v4().to_string();

    self.preflight(plan, assumptions)?;

    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: run_id.clone(),
      plan: plan.name().to_string(),
      steps: plan.steps().len(),
    });

    let result = self
      .run_steps(plan, brief, assumptions, &run_id, &cancel)
      .await;

    match &result {
      Ok(outcome) => match &outcome.state {
        RunState::Aborted { reason } => {
          self.notifier.notify(ExecutionEvent::RunAborted {
            run_id: run_id.clone(),
            reason: reason.clone(),
          });
        }
        _ => {
          self.notifier.notify(ExecutionEvent::RunCompleted {
            run_id: run_id.clone(),
          });
        }
      },
      Err(e) => {
        self.notifier.notify(ExecutionEvent::RunAborted {
          run_id: run_id.clone(),
          reason: AbortReason::Error {
            message: e.to_string(),
          },
        });
      }
    }

    result
  }

  /// Run the main step loop.
  #[instrument(skip_all, fields(run_id = %run_id, plan = %plan.name()))]
  async fn run_steps(
    &self,
    plan: &Plan,
    brief: &ProjectBrief,
    assumptions: Option<&FinancialAssumptions>,
    run_id: &str,
    cancel: &CancellationToken,
  ) -> Result<RunOutcome, ExecutionError> {
    let policy = plan.failure_policy();
    let mut store = ResultsStore::new();
    let mut trace = Vec::with_capacity(plan.steps().len());

    info!(steps = plan.steps().len(), policy = ?policy, "run started");

    for step in plan.steps() {
      if cancel.is_cancelled() {
        info!(completed = store.len(), "run cancelled");
        return Ok(RunOutcome {
          run_id: run_id.to_string(),
          state: RunState::Aborted {
            reason: AbortReason::Cancelled,
          },
          store,
          trace,
        });
      }

      self.notifier.notify(ExecutionEvent::StepStarted {
        run_id: run_id.to_string(),
        index: step.index,
        output_key: step.output_key.clone(),
      });

      let (record, result) = self
        .run_step(step, policy, brief, assumptions, &store, run_id)
        .await;
      store.record(&step.output_key, result.clone())?;
      trace.push(record);

      match result {
        StepResult::Success(text) => {
          info!(step = step.index, output_key = %step.output_key, "step completed");
          self.notifier.notify(ExecutionEvent::StepCompleted {
            run_id: run_id.to_string(),
            index: step.index,
            output_key: step.output_key.clone(),
            text,
          });
        }
        StepResult::Failure(reason) => {
          warn!(step = step.index, output_key = %step.output_key, error = %reason, "step failed");
          self.notifier.notify(ExecutionEvent::StepFailed {
            run_id: run_id.to_string(),
            index: step.index,
            output_key: step.output_key.clone(),
            error: reason.clone(),
          });

          if policy == FailurePolicy::Abort {
            return Ok(RunOutcome {
              run_id: run_id.to_string(),
              state: RunState::Aborted {
                reason: AbortReason::StepFailed {
                  output_key: step.output_key.clone(),
                  reason,
                },
              },
              store,
              trace,
            });
          }
        }
      }
    }

    info!(failures = store.failures(), "run completed");

    Ok(RunOutcome {
      run_id: run_id.to_string(),
      state: RunState::Completed,
      store,
      trace,
    })
  }

  async fn run_step(
    &self,
    step: &Step,
    policy: FailurePolicy,
    brief: &ProjectBrief,
    assumptions: Option<&FinancialAssumptions>,
    store: &ResultsStore,
    run_id: &str,
  ) -> (StepRecord, StepResult) {
    let started_at = Utc::now();
    let mut record = StepRecord {
      index: step.index,
      output_key: step.output_key.clone(),
      template: step.template,
      inputs: Vec::new(),
      search: None,
      started_at,
      finished_at: started_at,
      dispatched: false,
    };

    let result = match resolve_inputs(step, policy, store) {
      Err(reason) => StepResult::Failure(reason),
      Ok(inputs) => {
        record.inputs = inputs;
        if step.web_search {
          record.search = Some(self.search_context(step, brief, run_id).await);
        }

        let mut ctx = PromptContext::new(brief).with_inputs(&record.inputs);
        if let Some(search) = &record.search {
          ctx = ctx.with_search(search);
        }
        if let Some(assumptions) = assumptions {
          ctx = ctx.with_assumptions(assumptions);
        }

        match self.catalog.render(step.template, &ctx) {
          Err(e) => StepResult::Failure(format!("failed to build prompt: {}", e)),
          Ok(prompt) => {
            record.dispatched = true;
            debug!(output_key = %step.output_key, "calling completion gateway");
            match self.completion.complete(&prompt.system, &prompt.user).await {
              Ok(text) => StepResult::Success(text),
              Err(e) => StepResult::Failure(e.to_string()),
            }
          }
        }
      }
    };

    record.finished_at = Utc::now();
    (record, result)
  }

  /// Run the pre-step web search. Never fails the step.
  async fn search_context(&self, step: &Step, brief: &ProjectBrief, run_id: &str) -> SearchContext {
    let Some(search) = &self.search else {
      debug!(output_key = %step.output_key, "no search gateway; continuing without web data");
      return SearchContext::Unavailable("web search is not configured".to_string());
    };

    let query = search_query(brief);
    match search.search(&query).await {
      Ok(results) => SearchContext::Results(results.to_context()),
      Err(e) => {
        warn!(output_key = %step.output_key, error = %e, "web search failed; continuing without it");
        self.notifier.notify(ExecutionEvent::SearchFailed {
          run_id: run_id.to_string(),
          output_key: step.output_key.clone(),
          error: e.to_string(),
        });
        SearchContext::Unavailable(e.to_string())
      }
    }
  }
}

pub(crate) fn search_query(brief: &ProjectBrief) -> String {
  format!("{} market size trends competitors", brief.as_str())
}

/// Resolve a step's inputs from the store, in declared order.
///
/// Returns the failure diagnostic when an input cannot be used.
fn resolve_inputs(
  step: &Step,
  policy: FailurePolicy,
  store: &ResultsStore,
) -> Result<Vec<ResolvedInput>, String> {
  step
    .input_keys
    .iter()
    .map(|key| match store.get(key) {
      Some(StepResult::Success(text)) => Ok(ResolvedInput::new(key, text)),
      Some(failed @ StepResult::Failure(reason)) => match policy {
        FailurePolicy::ForwardFailures => Ok(ResolvedInput::new(key, failed.to_string())),
        FailurePolicy::Abort | FailurePolicy::SkipDependents => {
          Err(format!("dependency '{}' failed: {}", key, reason))
        }
      },
      None => Err(format!("dependency '{}' has no result in this run", key)),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use archimedes_config::{PlanDef, StepDef};

  use super::*;

  fn step_with_inputs(keys: &[&str]) -> Step {
    let def = PlanDef {
      name: "t".into(),
      steps: vec![
        StepDef::new(TemplateId::Branding),
        StepDef::new(TemplateId::TechStack),
        StepDef::new(TemplateId::OutreachEmail).with_inputs(keys.iter().copied()),
      ],
      failure_policy: FailurePolicy::default(),
    };
    Plan::lock(def).unwrap().steps()[2].clone()
  }

  #[test]
  fn test_resolve_inputs_in_declared_order() {
    let step = step_with_inputs(&["tech_stack", "branding"]);
    let mut store = ResultsStore::new();
    store.record("branding", StepResult::Success("B".into())).unwrap();
    store.record("tech_stack", StepResult::Success("T".into())).unwrap();

    let inputs = resolve_inputs(&step, FailurePolicy::Abort, &store).unwrap();
    assert_eq!(
      inputs,
      vec![ResolvedInput::new("tech_stack", "T"), ResolvedInput::new("branding", "B")]
    );
  }

  #[test]
  fn test_resolve_inputs_failed_dependency() {
    let step = step_with_inputs(&["branding"]);
    let mut store = ResultsStore::new();
    store
      .record("branding", StepResult::Failure("HTTP 500".into()))
      .unwrap();

    let reason = resolve_inputs(&step, FailurePolicy::SkipDependents, &store).unwrap_err();
    assert_eq!(reason, "dependency 'branding' failed: HTTP 500");

    let forwarded = resolve_inputs(&step, FailurePolicy::ForwardFailures, &store).unwrap();
    assert_eq!(forwarded[0].text, "Error: HTTP 500");
  }

  #[test]
  fn test_resolve_inputs_missing_key() {
    let step = step_with_inputs(&["branding"]);
    let reason = resolve_inputs(&step, FailurePolicy::SkipDependents, &ResultsStore::new())
      .unwrap_err();
    assert!(reason.contains("has no result"));
  }

  #[test]
  fn test_search_query_uses_brief() {
    let brief = ProjectBrief::new("AI tutor for kids").unwrap();
    assert_eq!(
      search_query(&brief),
      "AI tutor for kids market size trends competitors"
    );
  }
}
