//! docqa - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docqa::{
    chunking::{build_splitter, Chunker},
    cli::{Args, Commands, Config, SearchArgs, Verbosity},
    corpus,
    embedding::build_embedder,
    generation::{build_generator, OllamaGenerator, Provider},
    index::IndexBuilder,
    logging,
    rag::{PromptBuilder, QaOrchestrator, RelevanceGuard, Retriever},
    types::{ConversationTurn, RetrievalResult},
    RagError, VectorStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let result = match &args.command {
        Commands::Chunk { input, output } => run_chunk(&args, config, input, output),
        Commands::Index { chunks } => run_index(&args, config, chunks).await,
        Commands::Ask {
            question,
            history,
            search,
            json,
        } => run_ask(&args, config, question, history.as_ref(), search, *json).await,
        Commands::Retrieve { query, search } => run_retrieve(config, query, search),
        Commands::Info => show_info(&config).await,
        Commands::Config => show_config(&args, &config),
    };

    if let Err(err) = &result {
        if err
            .downcast_ref::<RagError>()
            .is_some_and(RagError::is_retryable)
        {
            eprintln!("{}", "The generation backend failed transiently; try again.".yellow());
        }
    }
    result
}

fn progress_bar(verbosity: Verbosity, len: u64, unit: &str) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let template = format!("{{spinner:.cyan}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} {{msg}}", unit);
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

fn spinner(verbosity: Verbosity, message: &str) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_chunk(
    args: &Args,
    config: Config,
    input: &Option<PathBuf>,
    output: &Option<PathBuf>,
) -> Result<()> {
    let input = input.clone().unwrap_or_else(|| config.raw_docs_dir());
    let output = output.clone().unwrap_or_else(|| config.chunks_path());

    let documents = corpus::load_documents(&input)
        .with_context(|| format!("Failed to load documents from {}", input.display()))?;

    let splitter = build_splitter(
        config.chunking.tokenizer,
        config.chunking.tokenizer_path.as_deref(),
    )?;
    let chunker = Chunker::new(config.chunking.clone(), splitter)?;

    let pb = progress_bar(args.verbosity(), documents.len() as u64, "documents");
    let mut chunks = Vec::new();
    for document in &documents {
        pb.set_message(document.doc_name.clone());
        chunks.extend(chunker.chunk_document(document)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    corpus::write_chunks(&output, &chunks)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} chunks from {} documents → {}",
        "✓".green(),
        chunks.len(),
        documents.len(),
        output.display()
    );
    Ok(())
}

async fn run_index(args: &Args, config: Config, chunks_path: &Option<PathBuf>) -> Result<()> {
    let chunks_path = chunks_path.clone().unwrap_or_else(|| config.chunks_path());
    let chunks = corpus::read_chunks(&chunks_path)
        .with_context(|| format!("Failed to read {}", chunks_path.display()))?;

    let loading = spinner(args.verbosity(), "Loading embedding model...");
    let embedding = config.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || build_embedder(&embedding)).await??;
    loading.finish_and_clear();

    let pb = progress_bar(args.verbosity(), chunks.len() as u64, "chunks");
    let builder = IndexBuilder::new(embedder, config.embedding.batch_size);
    let built = builder
        .build_to(
            &chunks,
            &config.index_path(),
            &config.metadata_path(),
            |done| pb.set_position(done as u64),
        )
        .await
        .context("Failed to build index")?;
    pb.finish_and_clear();

    println!(
        "{} indexed {} chunks ({}-d, {}) → {}",
        "✓".green(),
        built.len(),
        built.index.dimension(),
        built.index.model_id(),
        config.index_path().display()
    );
    Ok(())
}

fn open_retriever(config: &Config) -> Result<Retriever> {
    let store = VectorStore::open(&config.index_path(), &config.metadata_path())
        .context("Failed to open index snapshot; run `docqa chunk` and `docqa index` first")?;
    let embedder = build_embedder(&config.embedding)?;
    let retriever = Retriever::new(Arc::new(store), embedder)?.with_params(config.retrieval)?;
    Ok(retriever)
}

fn read_history(path: &PathBuf) -> Result<Vec<ConversationTurn>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    let turns = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse history {}", path.display()))?;
    Ok(turns)
}

async fn run_ask(
    args: &Args,
    mut config: Config,
    question: &str,
    history: Option<&PathBuf>,
    search: &SearchArgs,
    json: bool,
) -> Result<()> {
    search.apply(&mut config);
    config.validate()?;

    let history = history.map(read_history).transpose()?;

    let loading = spinner(args.verbosity(), "Loading index...");
    let retriever = Arc::new(open_retriever(&config)?);
    let generator = build_generator(&config.generation)?;
    loading.finish_and_clear();

    let guard = RelevanceGuard::new(&config.guard).with_store_vocabulary(retriever.store());
    let orchestrator = QaOrchestrator::new(
        guard,
        retriever,
        PromptBuilder::new(config.prompt),
        generator,
    )
    .with_timeout(config.generation.timeout());

    let thinking = spinner(args.verbosity(), "Thinking...");
    let answer = orchestrator
        .answer_question(question, history.as_deref())
        .await;
    thinking.finish_and_clear();
    let answer = answer?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("{} {}", "Sources:".bold(), answer.sources.join(", ").cyan());
    }
    if args.verbosity().show_chunks() {
        print_results(&answer.retrieved);
    }
    Ok(())
}

fn run_retrieve(mut config: Config, query: &str, search: &SearchArgs) -> Result<()> {
    search.apply(&mut config);
    config.validate()?;

    let retriever = open_retriever(&config)?;
    let results = retriever.retrieve_default(query)?;
    if results.is_empty() {
        println!("{}", "No chunk cleared the similarity threshold.".yellow());
        return Ok(());
    }
    print_results(&results);
    Ok(())
}

fn print_results(results: &[RetrievalResult]) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "\n{} {} {} {}",
            format!("[{}]", i + 1).bold(),
            format!("{:.3}", result.score).green(),
            result.metadata.doc_name.cyan(),
            format!("§ {}", result.metadata.section_title).dimmed()
        );
        println!("{}", result.metadata.url.dimmed());
        println!("{}", preview(&result.text, 300));
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

async fn show_info(config: &Config) -> Result<()> {
    let store = VectorStore::open(&config.index_path(), &config.metadata_path())
        .context("Failed to open index snapshot")?;
    let stats = store.stats();

    println!("{}", "Index".bold());
    println!("  path:       {}", config.index_path().display());
    println!("  metadata:   {}", config.metadata_path().display());
    println!("  model:      {}", stats.model_id);
    println!("  dimension:  {}", stats.dimension);
    println!("  chunks:     {}", stats.rows);
    println!("  documents:  {}", stats.documents);

    let generation = &config.generation;
    println!();
    println!("{}", "Generation".bold());
    println!("  provider:   {:?}", generation.provider);
    println!("  model:      {}", generation.model());
    println!("  endpoint:   {}", generation.base_url());
    if generation.provider == Provider::Ollama {
        let ollama = OllamaGenerator::from_config(generation)?;
        let status = if ollama.health_check().await? {
            "reachable".green()
        } else {
            "unreachable".red()
        };
        println!("  server:     {}", status);
    }
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => Config::default_path()
            .filter(|p| p.exists())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string()),
    };
    println!("{} {}", "# Configuration from".dimmed(), source.dimmed());
    println!("{}", config.to_toml()?);
    Ok(())
}
