use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use ragprobe_core::config::{expand_path, OracleErrorPolicy, ProviderChoice, Settings};
use ragprobe_core::data_processor::{DataProcessor, SAMPLE_QUESTIONS};
use ragprobe_core::types::{Document, EvaluationRequest, RagConfig, SearchType};
use ragprobe_embed::get_default_vectorizer;
use ragprobe_eval::{compare, Evaluator};
use ragprobe_oracle::build_oracle;
use ragprobe_vector::embed_chunks;

mod progress;
mod report;

use progress::ProgressReporter;
use report::Report;

/// Evaluate a RAG configuration against the baseline and explain its failures.
#[derive(Parser, Debug)]
#[command(name = "ragprobe", version, about, long_about = None)]
struct Cli {
    /// Directory holding ragprobe.toml and ragprobe.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: String,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every question under your configuration and the baseline
    Evaluate(EvaluateArgs),
    /// Show how documents are split under a configuration
    Chunk(ChunkArgs),
    /// Rank chunks for one query
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
struct RagArgs {
    /// Chunk size in characters (300, 500, 800 or 1200)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunk overlap as a percentage of the chunk size
    #[arg(long)]
    chunk_overlap: Option<u32>,

    /// semantic, keyword or hybrid
    #[arg(long)]
    search_type: Option<SearchType>,

    /// Chunks retrieved per question (3, 5 or 8)
    #[arg(long)]
    top_k: Option<usize>,

    /// Minimum confidence below which the answer is withheld
    #[arg(long)]
    abstain_threshold: Option<f32>,

    /// Require [N] citations for every claim
    #[arg(long)]
    strict_citations: Option<bool>,
}

impl RagArgs {
    fn apply(&self, config: &mut RagConfig) {
        if let Some(v) = self.chunk_size { config.chunk_size = v; }
        if let Some(v) = self.chunk_overlap { config.chunk_overlap = v; }
        if let Some(v) = self.search_type { config.search_type = v; }
        if let Some(v) = self.top_k { config.top_k = v; }
        if let Some(v) = self.abstain_threshold { config.abstain_threshold = v; }
        if let Some(v) = self.strict_citations { config.strict_citations = v; }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Directory of .txt/.md documents
    #[arg(long)]
    docs: String,

    /// Question file, one per line; the built-in sample questions otherwise
    #[arg(long)]
    questions: Option<String>,

    /// Load at most this many documents
    #[arg(long)]
    limit: Option<usize>,

    #[command(flatten)]
    rag: RagArgs,

    /// Answering backend: auto, groq, openai, anthropic, gemini or extractive
    #[arg(long, value_parser = parse_provider)]
    provider: Option<ProviderChoice>,

    /// API key for the hosted backend
    #[arg(long)]
    api_key: Option<String>,

    /// Keep going when the backend fails on a question
    #[arg(long)]
    record_oracle_errors: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    #[arg(long)]
    docs: String,

    #[command(flatten)]
    rag: RagArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,

    #[arg(long)]
    docs: String,

    #[command(flatten)]
    rag: RagArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn parse_provider(raw: &str) -> Result<ProviderChoice, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| format!("unknown provider '{raw}'"))
}

fn init_tracing(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    let layer = if json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry().with(layer.with_filter(filter)).init();
}

fn load_documents(dir: &str, limit: Option<usize>) -> anyhow::Result<Vec<Document>> {
    let dir = expand_path(dir);
    let processor = DataProcessor::new();
    let documents = processor
        .load_documents_limited(&dir, limit.unwrap_or(usize::MAX))
        .with_context(|| format!("loading documents from {}", dir.display()))?;
    if documents.is_empty() {
        bail!("no .txt or .md documents in {}", dir.display());
    }
    Ok(documents)
}

fn rag_config(settings: &Settings, args: &RagArgs) -> anyhow::Result<RagConfig> {
    let mut config = settings.rag;
    args.apply(&mut config);
    config.validate().context("invalid pipeline configuration")?;
    Ok(config)
}

fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn evaluate(mut settings: Settings, args: EvaluateArgs) -> anyhow::Result<()> {
    let documents = load_documents(&args.docs, args.limit)?;
    let questions = match &args.questions {
        Some(path) => DataProcessor::new()
            .load_questions(&expand_path(path))
            .context("loading questions")?,
        None => {
            tracing::info!("no question file given; using the sample questions");
            SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect()
        }
    };
    let config = rag_config(&settings, &args.rag)?;

    if let Some(provider) = args.provider { settings.oracle.provider = provider; }
    if args.api_key.is_some() { settings.oracle.api_key = args.api_key.clone(); }
    if args.record_oracle_errors { settings.eval.on_oracle_error = OracleErrorPolicy::Record; }

    let oracle = build_oracle(&settings.oracle).context("setting up the answering backend")?;
    let vectorizer = get_default_vectorizer(&settings.embedding);
    let evaluator = Evaluator::new(oracle.as_ref(), vectorizer.as_ref(), settings.eval.clone());
    tracing::info!(oracle = oracle.name(), documents = documents.len(), questions = questions.len(), "evaluating");

    let request = EvaluationRequest { documents, questions, config };
    let reporter = ProgressReporter::new(!args.no_progress);
    let response = evaluator.evaluate_with(&request, &reporter).context("evaluation failed")?;

    let report = Report {
        config: &request.config,
        comparison: compare(&response.metrics, &response.baseline_metrics),
        response: &response,
    };
    let rendered = match args.format {
        OutputFormat::Text => report.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    let output = args.output.as_deref().map(expand_path);
    emit(&rendered, output.as_deref())
}

fn chunk(settings: &Settings, args: ChunkArgs) -> anyhow::Result<()> {
    let documents = load_documents(&args.docs, None)?;
    let config = rag_config(settings, &args.rag)?;
    let chunks = DataProcessor::new().chunk(&documents, &config);
    tracing::info!(documents = documents.len(), chunks = chunks.len(), overlap = config.overlap_chars(), "chunked");

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&chunks)?,
        OutputFormat::Text => report::ChunkListing(&chunks).to_string(),
    };
    emit(&rendered, None)
}

fn search(settings: &Settings, args: SearchArgs) -> anyhow::Result<()> {
    let documents = load_documents(&args.docs, None)?;
    let config = rag_config(settings, &args.rag)?;
    let vectorizer = get_default_vectorizer(&settings.embedding);
    let chunks = embed_chunks(vectorizer.as_ref(), DataProcessor::new().chunk(&documents, &config));
    let query_vec = vectorizer.embed(&args.query);
    let hits: Vec<_> = ragprobe_hybrid::retrieve(&args.query, &query_vec, &chunks, config.search_type, config.top_k)
        .into_iter()
        .map(|mut hit| {
            hit.chunk.vector = None;
            hit
        })
        .collect();

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&hits)?,
        OutputFormat::Text => report::HitListing { query: &args.query, search_type: config.search_type, hits: &hits }.to_string(),
    };
    emit(&rendered, None)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_dir: PathBuf = expand_path(&cli.config_dir);
    let settings = Settings::load_from(&config_dir)
        .with_context(|| format!("loading settings from {}", config_dir.display()))?;

    match cli.command {
        Commands::Evaluate(args) => evaluate(settings, args),
        Commands::Chunk(args) => chunk(&settings, args),
        Commands::Search(args) => search(&settings, args),
    }
}
