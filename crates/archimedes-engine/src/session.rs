//! The presentation boundary.
//!
//! A [`Session`] launches at most one run at a time and keeps a read-only
//! snapshot of the latest run's state and results. The engine owns the run's
//! store; the snapshot is rebuilt from execution events as steps finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use archimedes_config::{FinancialAssumptions, ProjectBrief};
use archimedes_gateway::{CompletionGateway, SearchGateway};
use archimedes_workflow::Plan;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::{RunOutcome, WorkflowEngine};
use crate::error::{ExecutionError, SessionError};
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::result::{ResultsStore, StepResult};
use crate::state::{AbortReason, RunState};

const EVENT_CAPACITY: usize = 64;

/// Snapshot of the latest run, as seen by readers.
#[derive(Debug, Default)]
struct SessionView {
  run_id: Option<String>,
  state: RunState,
  results: ResultsStore,
}

impl SessionView {
  fn reset(&mut self) {
    self.run_id = None;
    self.state = RunState::Running { step_index: 0 };
    self.results.clear();
  }

  fn record(&mut self, output_key: &str, result: StepResult) {
    if let Err(e) = self.results.record(output_key, result) {
      warn!(output_key, error = %e, "dropping duplicate result in session view");
    }
  }

  fn apply(&mut self, event: &ExecutionEvent) {
    if let ExecutionEvent::RunStarted { run_id, .. } = event {
      self.run_id = Some(run_id.clone());
      self.state = RunState::Running { step_index: 0 };
      self.results.clear();
      return;
    }

    // Ignore stragglers from a previous run.
    if self.run_id.as_deref() != Some(event.run_id()) {
      return;
    }

    match event {
      ExecutionEvent::StepStarted { index, .. } => {
        self.state = RunState::Running { step_index: *index };
      }
      ExecutionEvent::StepCompleted {
        output_key, text, ..
      } => self.record(output_key, StepResult::Success(text.clone())),
      ExecutionEvent::StepFailed {
        output_key, error, ..
      } => self.record(output_key, StepResult::Failure(error.clone())),
      ExecutionEvent::RunCompleted { .. } => self.state = RunState::Completed,
      ExecutionEvent::RunAborted { reason, .. } => {
        self.state = RunState::Aborted {
          reason: reason.clone(),
        };
      }
      ExecutionEvent::RunStarted { .. } | ExecutionEvent::SearchFailed { .. } => {}
    }
  }
}

/// Updates the session view, then rebroadcasts the event.
struct SessionNotifier {
  view: Arc<RwLock<SessionView>>,
  events: broadcast::Sender<ExecutionEvent>,
}

impl ExecutionNotifier for SessionNotifier {
  fn notify(&self, event: ExecutionEvent) {
    write(&self.view).apply(&event);
    // No subscribers is fine.
    let _ = self.events.send(event);
  }
}

/// Resets the launch-in-progress flag when dropped.
struct LaunchGuard(Arc<AtomicBool>);

impl Drop for LaunchGuard {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// A handle to a launched run.
pub struct LaunchHandle {
  cancel: CancellationToken,
  handle: JoinHandle<Result<RunOutcome, ExecutionError>>,
}

impl LaunchHandle {
  /// Request cancellation. The run stops before its next step.
  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Wait for the run to finish.
  pub async fn wait(self) -> Result<RunOutcome, SessionError> {
    match self.handle.await {
      Ok(result) => result.map_err(SessionError::from),
      Err(e) => Err(SessionError::Join {
        message: e.to_string(),
      }),
    }
  }
}

/// One user's session: a default plan, the gateways, and the latest run.
pub struct Session {
  engine: Arc<WorkflowEngine<SessionNotifier>>,
  plan: Arc<Plan>,
  view: Arc<RwLock<SessionView>>,
  events: broadcast::Sender<ExecutionEvent>,
  launching: Arc<AtomicBool>,
}

impl Session {
  pub fn new(
    plan: Plan,
    completion: Arc<dyn CompletionGateway>,
    search: Option<Arc<dyn SearchGateway>>,
  ) -> Result<Self, ExecutionError> {
    let view = Arc::new(RwLock::new(SessionView::default()));
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let notifier = SessionNotifier {
      view: view.clone(),
      events: events.clone(),
    };
    let engine = WorkflowEngine::with_notifier(completion, search, notifier)?;

    Ok(Self {
      engine: Arc::new(engine),
      plan: Arc::new(plan),
      view,
      events,
      launching: Arc::new(AtomicBool::new(false)),
    })
  }

  /// Launch the session's plan on the current tokio runtime.
  ///
  /// Returns [`SessionError::NoRuntime`] when called outside a runtime.
  pub fn launch(
    &self,
    brief: ProjectBrief,
    assumptions: Option<FinancialAssumptions>,
  ) -> Result<LaunchHandle, SessionError> {
    self.spawn_run(self.plan.clone(), brief, assumptions)
  }

  /// Launch a different plan. The session's default plan is unchanged.
  pub fn launch_with_plan(
    &self,
    plan: Plan,
    brief: ProjectBrief,
    assumptions: Option<FinancialAssumptions>,
  ) -> Result<LaunchHandle, SessionError> {
    self.spawn_run(Arc::new(plan), brief, assumptions)
  }

  fn spawn_run(
    &self,
    plan: Arc<Plan>,
    brief: ProjectBrief,
    assumptions: Option<FinancialAssumptions>,
  ) -> Result<LaunchHandle, SessionError> {
    let runtime = Handle::try_current().map_err(|e| SessionError::NoRuntime {
      message: e.to_string(),
    })?;

    if self
      .launching
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(SessionError::LaunchInProgress);
    }
    let guard = LaunchGuard(self.launching.clone());

    self.engine.preflight(&plan, assumptions.as_ref())?;
    write(&self.view).reset();

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let engine = self.engine.clone();
    let view = self.view.clone();

    info!(plan = %plan.name(), "launching run");
    let handle = runtime.spawn(async move {
      let _guard = guard;
      let result = engine
        .execute(&plan, &brief, assumptions.as_ref(), token)
        .await;
      if let Err(e) = &result {
        error!(error = %e, "run failed");
        write(&view).state = RunState::Aborted {
          reason: AbortReason::Error {
            message: e.to_string(),
          },
        };
      }
      result
    });

    Ok(LaunchHandle { cancel, handle })
  }

  /// The latest result for `output_key`, if the current run has produced one.
  pub fn get_result(&self, output_key: &str) -> Option<StepResult> {
    read(&self.view).results.get(output_key).cloned()
  }

  /// Snapshot of every result so far.
  pub fn results(&self) -> ResultsStore {
    read(&self.view).results.clone()
  }

  pub fn state(&self) -> RunState {
    read(&self.view).state.clone()
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
    self.events.subscribe()
  }

  pub fn is_running(&self) -> bool {
    self.launching.load(Ordering::Acquire)
  }

  pub fn plan(&self) -> &Plan {
    &self.plan
  }
}

fn read(view: &RwLock<SessionView>) -> RwLockReadGuard<'_, SessionView> {
  view.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(view: &RwLock<SessionView>) -> RwLockWriteGuard<'_, SessionView> {
  view.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn started(run_id: &str) -> ExecutionEvent {
    ExecutionEvent::RunStarted {
      run_id: run_id.into(),
      plan: "p".into(),
      steps: 2,
    }
  }

  #[test]
  fn test_view_keeps_first_result_for_a_key() {
    let mut view = SessionView::default();
    view.apply(&started("a"));
    for text in ["first", "second"] {
      view.apply(&ExecutionEvent::StepCompleted {
        run_id: "a".into(),
        index: 0,
        output_key: "branding".into(),
        text: text.into(),
      });
    }
    assert_eq!(view.results.success("branding"), Some("first"));
    assert_eq!(view.results.len(), 1);
  }

  #[test]
  fn test_view_tracks_current_run() {
    let mut view = SessionView::default();
    view.apply(&started("a"));
    view.apply(&ExecutionEvent::StepCompleted {
      run_id: "a".into(),
      index: 0,
      output_key: "branding".into(),
      text: "Names".into(),
    });
    assert_eq!(view.results.success("branding"), Some("Names"));

    view.apply(&started("b"));
    assert!(view.results.is_empty());

    // Late event from the old run.
    view.apply(&ExecutionEvent::StepFailed {
      run_id: "a".into(),
      index: 1,
      output_key: "tech_stack".into(),
      error: "late".into(),
    });
    assert!(view.results.is_empty());

    view.apply(&ExecutionEvent::RunAborted {
      run_id: "b".into(),
      reason: AbortReason::Cancelled,
    });
    assert_eq!(
      view.state,
      RunState::Aborted {
        reason: AbortReason::Cancelled
      }
    );
  }
}
