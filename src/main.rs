use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use hotctx_core::pipeline::{Command, Outcome, Pipeline};
use hotctx_core::Config;
use hotctx_llm::ollama::OllamaEmbedder;
use hotctx_memory::QdrantOps;

#[derive(Parser, Debug)]
#[command(
    name = "hotctx",
    version,
    about = "Build a size-bounded hot context file from project documentation via semantic search"
)]
struct Cli {
    /// Config file (defaults to $HOTCTX_CONFIG, then <root>/config/default.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project root that sources and the output path are resolved against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Check that the embedding and vector index services respond
    Health,
    /// Chunk, embed and upsert every configured source
    Index,
    /// Retrieve, rerank and write the hot context file
    Generate,
    /// Index, then generate
    Refresh,
}

impl From<Commands> for Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Health => Self::Health,
            Commands::Index => Self::Index,
            Commands::Generate => Self::Generate,
            Commands::Refresh => Self::Refresh,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    match run(cli.config.as_deref(), &cli.root, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<&Path>, root: &Path, command: Commands) -> anyhow::Result<()> {
    let config_path = Config::resolve_path(config_path, root);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let embedder = OllamaEmbedder::new(config.embedding.url.clone(), config.embedding.model.clone())
        .context("failed to build embedding client")?;
    let qdrant = QdrantOps::new(&config.index.qdrant_url)
        .with_context(|| format!("invalid qdrant url {}", config.index.qdrant_url))?;

    let mut pipeline = Pipeline::new(config, root, Arc::new(embedder), Arc::new(qdrant));
    let outcome = pipeline.run(command.into()).await?;
    log_outcome(&outcome);
    Ok(())
}

fn log_outcome(outcome: &Outcome) {
    let (index, generate) = match outcome {
        Outcome::Health(_) => {
            tracing::info!("all systems operational");
            return;
        }
        Outcome::Index(_, index) => (Some(index), None),
        Outcome::Generate(_, generate) => (None, Some(generate)),
        Outcome::Refresh(_, index, generate) => (Some(index), Some(generate)),
    };

    if let Some(report) = index {
        tracing::info!(
            files = report.files_indexed,
            chunks = report.chunks_indexed,
            failed = report.failures.len(),
            missing = report.missing_sources.len(),
            "index finished"
        );
    }
    if let Some(report) = generate {
        tracing::info!(
            path = %report.output_path.display(),
            chunks = report.results,
            size_kb = format_args!("{:.1}", report.output.size_kb),
            lines = report.output.lines,
            "generate finished"
        );
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
