//! Archimedes Workflow Engine
//!
//! This crate runs a locked [`Plan`](archimedes_workflow::Plan) against a
//! completion gateway and an optional search gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │  - launch(brief, assumptions) spawns one run at a time      │
//! │  - get_result(key) reads a snapshot updated per step        │
//! │  - subscribe() streams ExecutionEvents                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkflowEngine                        │
//! │  - execute(plan, brief, assumptions, cancel) → RunOutcome   │
//! │  - resolves inputs from the run's ResultsStore              │
//! │  - applies the plan's FailurePolicy                         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │          PromptCatalog → SearchGateway / CompletionGateway  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use archimedes_engine::WorkflowEngine;
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = WorkflowEngine::new(completion, Some(search))?;
//! let outcome = engine
//!   .execute(&plan, &brief, Some(&assumptions), CancellationToken::new())
//!   .await?;
//!
//! if let Some(deck) = outcome.store.get("pitch_deck") {
//!   println!("{}", deck);
//! }
//! ```

mod engine;
mod error;
mod events;
mod result;
mod session;
mod state;

pub use engine::{RunOutcome, StepRecord, WorkflowEngine};
pub use error::{ExecutionError, SessionError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{ResultsStore, StepResult};
pub use session::{LaunchHandle, Session};
pub use state::{AbortReason, RunState};
