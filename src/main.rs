use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use archimedes_config::{
  FailurePolicy, FinancialAssumptions, PlanDef, ProjectBrief, Settings, TemplateId,
};
use archimedes_engine::{ExecutionEvent, ResultsStore, RunState, Session};
use archimedes_gateway::{connect_completion, connect_search};
use archimedes_workflow::Plan;

/// Output keys whose text is saved as a file after a run.
const ARTIFACTS: [(&str, &str); 2] = [
  ("pitch_deck", "pitch_deck_content.md"),
  ("outreach_email", "outreach_email.md"),
];

/// Archimedes - turn a one-line project idea into a founder's starter kit
#[derive(Parser)]
#[command(name = "archimedes")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a plan against a project brief
  Run(RunArgs),

  /// Inspect plans
  Plan {
    #[command(subcommand)]
    action: PlanAction,
  },
}

#[derive(clap::Args)]
struct RunArgs {
  /// One-line description of the project
  brief: String,

  /// Price per user per year, for the financial projection
  #[arg(long)]
  price: Option<f64>,

  /// Cost to serve per user per year, for the financial projection
  #[arg(long)]
  cost: Option<f64>,

  /// Plan file (JSON); the standard plan is used when omitted
  #[arg(long)]
  plan: Option<PathBuf>,

  /// Override the plan's failure policy
  #[arg(long, value_enum)]
  policy: Option<PolicyArg>,

  /// Directory the artifacts are written to
  #[arg(long, default_value = ".")]
  output_dir: PathBuf,
}

#[derive(Subcommand)]
enum PlanAction {
  /// Print the standard plan as JSON
  Show,

  /// Check a plan file
  Validate {
    /// Path to the plan file (JSON)
    plan_file: PathBuf,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
  Abort,
  SkipDependents,
  ForwardFailures,
}

impl From<PolicyArg> for FailurePolicy {
  fn from(arg: PolicyArg) -> Self {
    match arg {
      PolicyArg::Abort => FailurePolicy::Abort,
      PolicyArg::SkipDependents => FailurePolicy::SkipDependents,
      PolicyArg::ForwardFailures => FailurePolicy::ForwardFailures,
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing();

  match cli.command {
    Some(Commands::Run(args)) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run(args))?;
    }
    Some(Commands::Plan { action }) => match action {
      PlanAction::Show => show_plan()?,
      PlanAction::Validate { plan_file } => validate_plan(&plan_file)?,
    },
    None => {
      println!("archimedes - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .with_target(false)
    .init();
}

async fn run(args: RunArgs) -> Result<()> {
  let brief = ProjectBrief::new(&args.brief).context("invalid project brief")?;
  let assumptions = assumptions(args.price, args.cost)?;
  let plan = load_plan(args.plan.as_deref(), args.policy)?;
  if assumptions.is_none() && plan.uses_template(TemplateId::FinancialProjection) {
    bail!(
      "plan '{}' has a financial projection step; pass --price and --cost",
      plan.name()
    );
  }

  let settings = Settings::from_env().context("failed to load settings")?;
  let completion = connect_completion(&settings.completion);
  let search = connect_search(&settings.search);

  eprintln!(
    "Running plan '{}' ({} steps, {:?} on failure)",
    plan.name(),
    plan.steps().len(),
    plan.failure_policy()
  );

  let session =
    Session::new(plan, completion, Some(search)).context("failed to create workflow engine")?;
  let events = session.subscribe();
  let handle = session
    .launch(brief, assumptions)
    .context("failed to launch run")?;

  cancel_on_ctrl_c(handle.cancellation_token());
  let progress = tokio::spawn(report_progress(events));

  let outcome = handle.wait().await.context("run failed")?;
  let _ = progress.await;

  for (key, result) in outcome.store.iter() {
    let title = session.plan().get_step(key).map_or(key, |s| s.name.as_str());
    println!("## {}\n\n{}\n", title, result);
  }

  for path in write_artifacts(&outcome.store, &args.output_dir)? {
    eprintln!("Saved {}", path.display());
  }

  match outcome.state {
    RunState::Aborted { reason } => bail!("run aborted: {}", reason),
    _ => {
      eprintln!(
        "Run {} completed: {} steps, {} failed",
        outcome.run_id,
        outcome.store.len(),
        outcome.store.failures()
      );
      Ok(())
    }
  }
}

fn assumptions(price: Option<f64>, cost: Option<f64>) -> Result<Option<FinancialAssumptions>> {
  match (price, cost) {
    (None, None) => Ok(None),
    (Some(price), Some(cost)) => FinancialAssumptions::new(price, cost)
      .map(Some)
      .context("invalid financial assumptions"),
    _ => bail!("--price and --cost must be given together"),
  }
}

fn load_plan(path: Option<&Path>, policy: Option<PolicyArg>) -> Result<Plan> {
  let mut def = match path {
    Some(path) => PlanDef::from_file(path)
      .with_context(|| format!("failed to load plan file: {}", path.display()))?,
    None => PlanDef::standard(),
  };
  if let Some(policy) = policy {
    def = def.with_failure_policy(policy.into());
  }

  let name = def.name.clone();
  Plan::try_from(def).with_context(|| format!("plan '{}' is invalid", name))
}

fn cancel_on_ctrl_c(token: CancellationToken) {
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!("Cancelling after the current step...");
      token.cancel();
    }
  });
}

async fn report_progress(mut events: tokio::sync::broadcast::Receiver<ExecutionEvent>) {
  loop {
    match events.recv().await {
      Ok(event) => {
        if let Some(line) = progress_line(&event) {
          eprintln!("{}", line);
        }
        if matches!(
          event,
          ExecutionEvent::RunCompleted { .. } | ExecutionEvent::RunAborted { .. }
        ) {
          break;
        }
      }
      Err(RecvError::Lagged(_)) => continue,
      Err(RecvError::Closed) => break,
    }
  }
}

fn progress_line(event: &ExecutionEvent) -> Option<String> {
  match event {
    ExecutionEvent::StepStarted {
      index, output_key, ..
    } => Some(format!("[{}] {}...", index + 1, output_key)),
    ExecutionEvent::SearchFailed { error, .. } => {
      Some(format!("    web search unavailable: {}", error))
    }
    ExecutionEvent::StepCompleted { .. } => Some("    done".to_string()),
    ExecutionEvent::StepFailed { error, .. } => Some(format!("    failed: {}", error)),
    ExecutionEvent::RunAborted { reason, .. } => Some(format!("Run aborted: {}", reason)),
    ExecutionEvent::RunStarted { .. } | ExecutionEvent::RunCompleted { .. } => None,
  }
}

/// Write the successful artifact outputs to `dir`. Failed or missing
/// outputs are skipped.
fn write_artifacts(store: &ResultsStore, dir: &Path) -> Result<Vec<PathBuf>> {
  let mut written = Vec::new();
  for (key, file_name) in ARTIFACTS {
    let Some(text) = store.success(key) else {
      continue;
    };
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, text)
      .with_context(|| format!("failed to write artifact: {}", path.display()))?;
    written.push(path);
  }
  Ok(written)
}

fn show_plan() -> Result<()> {
  println!("{}", serde_json::to_string_pretty(&PlanDef::standard())?);
  Ok(())
}

fn validate_plan(plan_file: &Path) -> Result<()> {
  let plan = load_plan(Some(plan_file), None)?;
  println!("{}", describe_plan(&plan));
  Ok(())
}

/// Summarize a locked plan: entry points, join points, and for each step
/// what it reads and how many later steps depend on it.
fn describe_plan(plan: &Plan) -> String {
  let graph = plan.graph();

  let mut joins: Vec<_> = graph.join_points().iter().cloned().collect();
  joins.sort();

  let mut out = format!(
    "Plan '{}' is valid ({} steps)\n  entry points: {}\n",
    plan.name(),
    plan.steps().len(),
    graph.entry_points().join(", ")
  );
  if !joins.is_empty() {
    out.push_str(&format!("  join points:  {}\n", joins.join(", ")));
  }

  for step in plan.steps() {
    let key = &step.output_key;
    let inputs = graph.upstream(key);
    let reads = if inputs.is_empty() {
      "-".to_string()
    } else {
      inputs.join(", ")
    };
    out.push_str(&format!(
      "  {}. {}{} <- {} ({} dependents)\n",
      step.index + 1,
      key,
      if graph.is_join_point(key) { " [join]" } else { "" },
      reads,
      graph.transitive_downstream(key).len()
    ));
  }
  out.trim_end().to_string()
}
