//! Execution events and notifiers for observability.
//!
//! Events are emitted during a run so consumers can observe progress, update
//! a UI snapshot, stream to a terminal, etc.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::state::AbortReason;

/// Events emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// A run has started with an empty results store.
  RunStarted {
    run_id: String,
    plan: String,
    steps: usize,
  },

  /// A step is about to resolve its inputs.
  StepStarted {
    run_id: String,
    index: usize,
    output_key: String,
  },

  /// The web search for a step failed; the step continues without it.
  SearchFailed {
    run_id: String,
    output_key: String,
    error: String,
  },

  /// A step produced text.
  StepCompleted {
    run_id: String,
    index: usize,
    output_key: String,
    text: String,
  },

  /// A step produced a failure.
  StepFailed {
    run_id: String,
    index: usize,
    output_key: String,
    error: String,
  },

  /// Every step ran.
  RunCompleted { run_id: String },

  /// The run stopped early.
  RunAborted { run_id: String, reason: AbortReason },
}

impl ExecutionEvent {
  pub fn run_id(&self) -> &str {
    match self {
      ExecutionEvent::RunStarted { run_id, .. }
      | ExecutionEvent::StepStarted { run_id, .. }
      | ExecutionEvent::SearchFailed { run_id, .. }
      | ExecutionEvent::StepCompleted { run_id, .. }
      | ExecutionEvent::StepFailed { run_id, .. }
      | ExecutionEvent::RunCompleted { run_id }
      | ExecutionEvent::RunAborted { run_id, .. } => run_id,
    }
  }
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event - implementations decide
/// what to do with them (update a snapshot, broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

impl<N: ExecutionNotifier + ?Sized> ExecutionNotifier for Arc<N> {
  fn notify(&self, event: ExecutionEvent) {
    (**self).notify(event)
  }
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Event volume is a handful per step, so an unbounded channel never holds
/// much even when the consumer is slow.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
