use clap::{Parser, Subcommand};
use discovery_cli::config::DiscoveryConfig;
use discovery_cli::input::read_transcript;
use discovery_cli::llm::{create_generator, create_llm_client};
use discovery_core::types::QuestionStatus;
use discovery_core::{Database, DiscoveryEngine, FileExtractor, OperationResult};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Requirements discovery from statements of work", long_about = None)]
struct Cli {
    /// Path to config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project from a SOW and generate its first questions
    Start {
        #[arg(long)]
        name: String,
        #[arg(long)]
        sow: PathBuf,
        /// Supporting documents matched against the requirements
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },
    /// Re-extract the SOW of an existing project
    ProcessDocuments {
        #[arg(long, alias = "name")]
        project: String,
        #[arg(long)]
        sow: PathBuf,
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },
    /// Generate questions from the stored SOW data
    GenerateQuestions {
        #[arg(long, alias = "name")]
        project: String,
    },
    /// Reconcile a meeting transcript against open questions
    Transcript {
        #[arg(long, alias = "name")]
        project: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Reconcile additional documents against open questions
    Documents {
        #[arg(long, alias = "name")]
        project: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List questions, optionally filtered by status
    Questions {
        #[arg(long, alias = "name")]
        project: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<QuestionStatus>,
    },
    /// Show whether discovery is complete
    Status {
        #[arg(long, alias = "name")]
        project: String,
    },
    /// Print the full discovery report
    Report {
        #[arg(long, alias = "name")]
        project: String,
    },
    /// List all projects
    Projects,
}

fn parse_status(value: &str) -> Result<QuestionStatus, String> {
    QuestionStatus::parse(value).ok_or_else(|| {
        format!("unknown status '{value}' (expected unanswered, partially_answered or answered)")
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    let (config, config_path) = DiscoveryConfig::load(cli.config.as_deref())?;
    tracing::debug!(path = %config_path.display(), "Loaded configuration");

    let db = Arc::new(Database::new(&config.database.path)?);
    tracing::info!(path = %config.database.path.display(), "Opened database");

    // Listing needs no model credentials
    if let Command::Projects = cli.command {
        return print_projects(&db);
    }

    let client = create_llm_client(&config)?;
    let engine = DiscoveryEngine::new(
        db,
        create_generator(&config, client),
        Arc::new(FileExtractor::new()),
        config.engine.clone(),
    );

    run(&engine, cli.command).await
}

async fn run(engine: &DiscoveryEngine, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Start { name, sow, docs } => emit(&engine.start_discovery(&name, &sow, &docs).await),
        Command::ProcessDocuments { project, sow, docs } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.process_documents(id, &sow, &docs).await),
            Err(failed) => emit(&failed),
        },
        Command::GenerateQuestions { project } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.generate_questions(id).await),
            Err(failed) => emit(&failed),
        },
        Command::Transcript { project, file } => match resolve(engine, &project) {
            Ok(id) => match read_transcript(&file).await {
                Ok(text) => emit(&engine.process_meeting_transcript(id, &text).await),
                Err(e) => emit(&OperationResult::<()>::error(e)),
            },
            Err(failed) => emit(&failed),
        },
        Command::Documents { project, paths } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.process_additional_documents(id, &paths).await),
            Err(failed) => emit(&failed),
        },
        Command::Questions { project, status } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.get_current_questions(id, status).await),
            Err(failed) => emit(&failed),
        },
        Command::Status { project } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.is_discovery_complete(id).await),
            Err(failed) => emit(&failed),
        },
        Command::Report { project } => match resolve(engine, &project) {
            Ok(id) => emit(&engine.generate_discovery_report(id).await),
            Err(failed) => emit(&failed),
        },
        Command::Projects => print_projects(engine.database()),
    }
}

fn print_projects(db: &Database) -> anyhow::Result<ExitCode> {
    let projects = db.list_projects()?;
    println!("{}", serde_json::to_string_pretty(&projects)?);
    Ok(ExitCode::SUCCESS)
}

/// Projects are addressed by name; the most recent one wins
fn resolve(engine: &DiscoveryEngine, name: &str) -> Result<i64, OperationResult<()>> {
    engine
        .find_project(name)
        .map(|project| project.id)
        .map_err(OperationResult::error)
}

fn emit<T: Serialize>(result: &OperationResult<T>) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
