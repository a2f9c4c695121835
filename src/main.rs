use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use coderag_core::Config;
use coderag_index::answer::Answerer;
use coderag_index::chunker::ChunkerConfig;
use coderag_index::context::{assemble_context, display_header, format_snippet};
use coderag_index::indexer::{CodeIndexer, IndexReport, IndexerConfig};
use coderag_index::retriever::{CodeRetriever, RetrievalConfig};
use coderag_index::store::IndexStore;
use coderag_index::walker::{CorpusWalker, WalkerConfig};
use coderag_llm::openai::OpenAiProvider;

/// Semantic search and question answering over a Python codebase
#[derive(Parser)]
#[command(name = "coderag", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index for a source directory
    Index {
        /// Directory to index; its base name becomes the codebase name
        source_dir: PathBuf,
    },

    /// Retrieve the code most relevant to a question
    Query {
        question: String,

        /// Name of a previously indexed codebase
        #[arg(long)]
        codebase: String,

        /// Also ask the chat model for an answer grounded in the results
        #[arg(long)]
        answer: bool,

        /// Number of results (overrides config)
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config);
    let mut config = Config::load(&config_path)?;
    config.resolve_secrets();

    match cli.command {
        Command::Index { source_dir } => {
            config.validate()?;
            run_index(&config, &source_dir).await
        }
        Command::Query {
            question,
            codebase,
            answer,
            top_k,
        } => {
            if let Some(k) = top_k {
                config.index.top_k = k;
            }
            config.validate()?;
            run_query(&config, &codebase, &question, answer).await
        }
    }
}

async fn run_index(config: &Config, source_dir: &Path) -> anyhow::Result<()> {
    let root = source_dir
        .canonicalize()
        .with_context(|| format!("cannot open source directory {}", source_dir.display()))?;
    let codebase = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("{} has no base name", root.display()))?;

    let provider = Arc::new(build_provider(config)?);
    let store = IndexStore::new(&config.index.vector_dir, &codebase);
    let walker = CorpusWalker::python(WalkerConfig {
        chunker: ChunkerConfig {
            max_unit_length: config.index.max_unit_length,
        },
        head_lines: config.index.head_lines,
    });
    let indexer = CodeIndexer::new(
        provider,
        config.index.embedding_dim,
        IndexerConfig {
            batch_size: config.index.batch_size,
        },
    );

    tracing::info!(codebase = %codebase, root = %root.display(), "indexing started");
    let report = indexer.index_project(&walker, &root, &store).await?;
    log_report(&report);
    println!(
        "Indexed {} of {} units for `{codebase}` into {}",
        report.rows_written,
        report.units,
        store.dir().display()
    );
    Ok(())
}

async fn run_query(
    config: &Config,
    codebase: &str,
    question: &str,
    answer: bool,
) -> anyhow::Result<()> {
    let (retriever, provider) = open_retriever(config, codebase)?;

    let results = retriever.retrieve(question).await?;
    if results.is_empty() {
        println!("No results for `{codebase}`.");
    }
    for result in &results {
        tracing::debug!(rank = result.rank, distance = result.distance, id = result.record.id());
        println!("{}", display_header(result));
        println!("{}\n", format_snippet(&result.record).await);
    }

    if answer {
        let context = assemble_context(&results).await;
        let reply = Answerer::new(provider)
            .answer(&context, question)
            .await
            .context("answer generation failed")?;
        println!("Answer:\n{reply}");
    }
    Ok(())
}

/// Load the codebase index, then build the provider. A missing index is
/// reported before the API key is required.
fn open_retriever(
    config: &Config,
    codebase: &str,
) -> anyhow::Result<(CodeRetriever<OpenAiProvider>, Arc<OpenAiProvider>)> {
    let store = IndexStore::new(&config.index.vector_dir, codebase);
    let loaded = store.load()?;
    tracing::debug!(codebase, rows = loaded.index.len(), "index loaded");

    let provider = Arc::new(build_provider(config)?);
    let retriever = CodeRetriever::from_loaded(
        loaded,
        Arc::clone(&provider),
        RetrievalConfig {
            top_k: config.index.top_k,
        },
    );
    Ok((retriever, provider))
}

fn build_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let api_key = config.api_key()?;
    Ok(OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.chat_model.clone(),
        config.llm.max_tokens,
        Some(config.llm.embedding_model.clone()),
    )
    .with_temperature(config.llm.temperature))
}

fn log_report(report: &IndexReport) {
    let walk = &report.walk;
    tracing::info!(
        files = walk.files_scanned,
        unreadable = walk.files_unreadable,
        functions = walk.function_units,
        skipped_symbols = walk.symbols_failed + walk.duplicates + walk.oversized,
        "walk summary"
    );
    tracing::info!(
        units = report.units,
        committed = report.batches_committed,
        skipped = report.batches_skipped,
        rows = report.rows_written,
        duration_ms = report.duration_ms,
        "index summary"
    );
    for error in &report.errors {
        tracing::warn!("{error}");
    }
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = std::env::var("CODERAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
