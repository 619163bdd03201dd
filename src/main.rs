use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use harvest_config::{DagDef, agricultural_crop_production};
use harvest_databricks::{ConnectionResolver, DatabricksClient, EnvConnectionResolver};
use harvest_engine::{ChannelNotifier, DagRunner, ExecutionEvent, ExecutionNotifier, RunStatus};
use harvest_log::{LogConfig, SinkRegistry};
use harvest_trigger::{LoggingObserver, RunNowOperator, RunRequest};

/// Harvest - on-demand Databricks job trigger with lifecycle logging
#[derive(Parser)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.harvest)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Activate the definition once and wait for the run to finish
  Run {
    #[command(flatten)]
    source: Source,
  },

  /// Host the definition, triggering one manual run per line read on stdin
  /// (line content is ignored)
  Serve {
    #[command(flatten)]
    source: Source,
  },

  /// Print the effective definition as JSON
  Show {
    /// Path to a definition file (JSON)
    #[arg(long)]
    definition: Option<PathBuf>,
  },
}

#[derive(clap::Args)]
struct Source {
  /// Path to a definition file (JSON). Falls back to <data-dir>/definition.json,
  /// then to the built-in agricultural definition.
  #[arg(long)]
  definition: Option<PathBuf>,

  /// Directory for the run log (default: /opt/airflow/logs/agricultural_crop_etl)
  #[arg(long)]
  log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".harvest"),
  };

  match cli.command {
    Some(Commands::Run { source }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_once(source, data_dir))
    }
    Some(Commands::Serve { source }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(serve(source, data_dir))
    }
    Some(Commands::Show { definition }) => {
      let dag = load_definition(definition.as_deref(), &data_dir)?;
      println!("{}", serde_json::to_string_pretty(&dag)?);
      Ok(())
    }
    None => {
      println!("harvest - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_once(source: Source, data_dir: PathBuf) -> Result<()> {
  let dag = load_definition(source.definition.as_deref(), &data_dir)?;
  let runner = build_runner(dag, source.log_dir, harvest_engine::NoopNotifier)?;

  let cancel = CancellationToken::new();
  let interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      interrupt.cancel();
    }
  });

  let run = runner.execute_once(RunRequest::manual(), cancel).await;
  println!("{}", serde_json::to_string_pretty(&run)?);

  if run.status != RunStatus::Succeeded {
    bail!(
      "run {} ended {:?}: {}",
      run.run_id,
      run.status,
      run.last_error.as_deref().unwrap_or("no error recorded")
    );
  }
  Ok(())
}

async fn serve(source: Source, data_dir: PathBuf) -> Result<()> {
  let dag = load_definition(source.definition.as_deref(), &data_dir)?;
  let manual_only = dag.is_manual();

  let (tx, mut events) = mpsc::unbounded_channel();
  let runner = build_runner(dag, source.log_dir, ChannelNotifier::new(tx))?;
  let sender = runner.sender();

  let cancel = CancellationToken::new();
  let handle = tokio::spawn(runner.start(cancel.clone()));

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdin_open = true;
  let mut pending = HashSet::new();

  let interrupted = tokio::signal::ctrl_c();
  tokio::pin!(interrupted);

  loop {
    tokio::select! {
      _ = &mut interrupted => {
        info!("interrupted, cancelling in-flight runs");
        break;
      }
      line = lines.next_line(), if stdin_open => {
        match line.context("failed to read stdin")? {
          Some(_) => {
            let request = RunRequest::manual();
            pending.insert(request.request_id.clone());
            sender
              .send(request)
              .await
              .map_err(|_| anyhow!("runner stopped accepting activations"))?;
          }
          None => stdin_open = false,
        }
      }
      Some(event) = events.recv() => {
        println!("{}", serde_json::to_string(&event)?);
        if let Some(run_id) = finished_run(&event) {
          pending.remove(run_id);
        }
      }
    }

    // Scheduled definitions keep running until interrupted.
    if !stdin_open && manual_only && pending.is_empty() {
      break;
    }
  }

  cancel.cancel();
  handle.await.context("runner task failed")??;
  Ok(())
}

fn load_definition(path: Option<&Path>, data_dir: &Path) -> Result<DagDef> {
  let default_path = data_dir.join("definition.json");
  let path = match path {
    Some(path) => path,
    None if default_path.exists() => default_path.as_path(),
    None => {
      info!("no definition file, using the built-in definition");
      return Ok(agricultural_crop_production());
    }
  };

  let dag = DagDef::load(path)
    .with_context(|| format!("failed to load definition: {}", path.display()))?;
  info!(dag_id = %dag.dag_id, path = %path.display(), "loaded definition");
  Ok(dag)
}

fn build_runner<N: ExecutionNotifier + 'static>(
  dag: DagDef,
  log_dir: Option<PathBuf>,
  notifier: N,
) -> Result<DagRunner<N>> {
  let defaults = LogConfig::default();
  let log_config = LogConfig::new(log_dir.unwrap_or(defaults.dir), defaults.component);
  let sink = SinkRegistry::global()
    .get_or_init(&log_config)
    .with_context(|| format!("failed to open log: {}", log_config.path().display()))?;

  let connection = EnvConnectionResolver::new()
    .resolve(&dag.task.connection_id)
    .with_context(|| format!("failed to resolve connection '{}'", dag.task.connection_id))?;
  let client = Arc::new(DatabricksClient::new(connection));

  let operator = RunNowOperator::new(dag.task.clone(), client);
  let observer = Arc::new(LoggingObserver::new(sink));
  DagRunner::with_notifier(dag, operator, observer, notifier).context("failed to create runner")
}

fn finished_run(event: &ExecutionEvent) -> Option<&str> {
  match event {
    ExecutionEvent::RunSucceeded { run_id, .. }
    | ExecutionEvent::RunFailed { run_id, .. }
    | ExecutionEvent::RunCancelled { run_id } => Some(run_id),
    _ => None,
  }
}
