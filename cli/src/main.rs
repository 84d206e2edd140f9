//! CLI entrypoint for Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod progress;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use commands::{Cli, Command};
use council_application::{
    ConversationLogger, DeliberationError, DeliberationOrchestrator, HealthTracker,
    NoConversationLogger, PersistenceGateway, PromoteMemoryInput, PromoteMemoryUseCase,
    RunDeliberationInput, SessionQuery,
};
use council_domain::{MemoryId, SessionId, TimeWindow};
use council_infrastructure::{
    ConfigLoader, FileConfig, JsonFileStore, JsonlConversationLogger, ScriptedParticipant,
    ScriptedParticipantSpec,
};
use progress::ProgressReporter;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow::anyhow!("{}", e))?
    };
    if let Some(dir) = &cli.data_dir {
        config.persistence.data_dir = Some(dir.clone());
    }

    // Guard must live until exit so buffered log lines are flushed
    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting Council");

    if let Command::Config = cli.command {
        return show_config(&config, cli.config.as_deref());
    }

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    if council_domain::config::has_errors(&issues) {
        for issue in issues.iter().filter(|i| i.is_error()) {
            eprintln!("config error: {}", issue.message);
        }
        bail!("Invalid configuration");
    }

    // === Dependency Injection ===
    let data_dir = config.persistence.resolved_data_dir();
    let store = JsonFileStore::open(&data_dir)
        .await
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    let gateway = Arc::new(PersistenceGateway::with_cache_capacity(
        Box::new(store),
        config.persistence.cache_capacity,
    ));

    match cli.command {
        Command::Simulate {
            domain,
            topic,
            participants,
            script,
            session_id,
            quiet,
        } => {
            let candidates = match script {
                Some(path) => load_script(&path)?,
                None => ScriptedParticipant::chorus(participants),
            };
            let mut input = RunDeliberationInput::new(domain, topic, candidates);
            if let Some(id) = session_id {
                input = input.with_session_id(SessionId::new(id));
            }
            simulate(&config, gateway, input, quiet).await
        }
        Command::Session { id } => print_json(&gateway.get_session(&SessionId::new(id)).await?),
        Command::Metrics { id } => print_json(&gateway.get_metrics(&SessionId::new(id)).await?),
        Command::Memories { domain, days } => {
            let window = match days {
                Some(days) => TimeWindow::last(chrono::Duration::days(days), Utc::now()),
                None => TimeWindow::all(),
            };
            print_json(&gateway.list_memories(&domain, window).await?)
        }
        Command::PromoteSacred { memory_id } => {
            print_json(&gateway.promote_sacred(&MemoryId::new(memory_id)).await?)
        }
        Command::Promote {
            session_id,
            sequence,
            sacred,
        } => {
            let mut input = PromoteMemoryInput::new(SessionId::new(session_id), sequence);
            if sacred {
                input = input.sacred();
            }
            let record = PromoteMemoryUseCase::new(gateway).execute(input).await?;
            print_json(&record)
        }
        Command::Config => show_config(&config, cli.config.as_deref()),
    }
}

async fn simulate(
    config: &FileConfig,
    gateway: Arc<PersistenceGateway>,
    input: RunDeliberationInput,
    quiet: bool,
) -> Result<()> {
    let deliberation = config.to_deliberation_config();
    let health = Arc::new(HealthTracker::new(deliberation.health_window));

    let logger: Arc<dyn ConversationLogger> = match &config.logging.transcript {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    // Ctrl-C cancels the session cooperatively
    let cancellation = CancellationToken::new();
    let ctrl_c_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let orchestrator = DeliberationOrchestrator::new(gateway, health, deliberation)
        .with_conversation_logger(logger)
        .with_cancellation(cancellation);

    let result = if quiet {
        orchestrator.execute(input).await
    } else {
        let progress = ProgressReporter::new();
        orchestrator.execute_with_progress(input, &progress).await
    };

    match result {
        Ok(outcome) => print_json(&outcome.metrics),
        Err(error) => {
            report_failure(&error);
            Err(error.into())
        }
    }
}

/// The user-visible failure report: session id, final state, reason code
fn report_failure(error: &DeliberationError) {
    if let (Some(id), Some(state)) = (error.session_id(), error.state()) {
        let reason = error
            .reason_code()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        eprintln!("session {} ended {} ({})", id, state, reason);
    }
}

fn load_script(path: &Path) -> Result<Vec<council_application::ParticipantCandidate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let specs: Vec<ScriptedParticipantSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing script {}", path.display()))?;
    Ok(specs
        .into_iter()
        .map(ScriptedParticipantSpec::into_candidate)
        .collect())
}

fn show_config(config: &FileConfig, explicit: Option<&Path>) -> Result<()> {
    for line in ConfigLoader::describe_sources(explicit) {
        eprintln!("{}", line);
    }
    for issue in config.validate() {
        let level = if issue.is_error() { "error" } else { "warning" };
        eprintln!("{}: {}", level, issue.message);
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
///
/// With a log file configured, a daily-rolling non-blocking file layer is
/// added next to stderr.
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"), // -vvv or more
        },
    };

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .context("logging.file must name a file")?;
            std::fs::create_dir_all(directory)
                .with_context(|| format!("creating log directory {}", directory.display()))?;
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
