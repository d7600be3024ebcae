//! deskbot CLI - Ask the support assistant from the terminal.
//!
//! Loads a knowledge base from a JSON file, ingests it into the in-memory
//! index, and answers questions with either the deterministic mock
//! capabilities (default, offline) or live HTTP endpoints (`--live`).

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use deskbot_chunk::SectionChunker;
use deskbot_core::{
    Answer, Chunker, CompletionClient, DeskbotConfig, Document, DocumentMeta, EmbeddingClient,
    SourceKind, VectorIndex,
};
use deskbot_index::MemoryIndex;
use deskbot_llm::{HttpCompleter, HttpEmbedder, MockCompleter, MockEmbedder};
use deskbot_pipeline::AnswerEngine;
use deskbot_query::QueryClassifier;

/// deskbot - Retrieval-augmented support-desk assistant
#[derive(Parser)]
#[command(name = "deskbot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: discovered deskbot.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question against a knowledge base file
    Ask {
        /// The question to answer
        question: String,

        /// Knowledge base JSON file (array of documents)
        #[arg(short, long)]
        kb: PathBuf,

        /// Use live embedding/completion endpoints instead of mocks
        #[arg(long)]
        live: bool,
    },

    /// Chunk a text file and print the resulting chunks
    Chunk {
        /// Path to the file to chunk
        path: PathBuf,

        /// Category to stamp on the chunks
        #[arg(long, default_value = "General")]
        category: String,
    },

    /// Classify a question against the category taxonomy
    Classify {
        /// The question to classify
        question: String,
    },

    /// Chunk a knowledge base file and print per-category statistics
    Stats {
        /// Knowledge base JSON file (array of documents)
        #[arg(short, long)]
        kb: PathBuf,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&PathBuf>) -> Result<DeskbotConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(DeskbotConfig::load(p)?),
        None => Ok(DeskbotConfig::load_default()?),
    }
}

fn load_kb(path: &PathBuf) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let docs: Vec<Document> = serde_json::from_str(&content)?;
    Ok(docs)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Ask { question, kb, live } => {
            let docs = load_kb(&kb)?;
            let index = Arc::new(MemoryIndex::new(config.index.collection.as_str()));

            if live {
                let embedder = Arc::new(HttpEmbedder::new(config.embedding.clone())?);
                let completer = Arc::new(HttpCompleter::new(&config.generation)?);
                ask(config, index, embedder, completer, &docs, &question).await?;
            } else {
                let embedder = Arc::new(MockEmbedder::new());
                let completer = Arc::new(MockCompleter::new());
                ask(config, index, embedder, completer, &docs, &question).await?;
            }
        }
        Commands::Chunk { path, category } => {
            chunk_file(&config, &path, &category)?;
        }
        Commands::Classify { question } => {
            let classifier = QueryClassifier::new(config.taxonomy.clone());
            let result = classifier.classify(&question);
            println!("{}  (confidence {:.2})", result.category, result.confidence);
        }
        Commands::Stats { kb } => {
            let docs = load_kb(&kb)?;
            kb_stats(&config, &docs)?;
        }
    }

    Ok(())
}

async fn ask<I, E, C>(
    config: DeskbotConfig,
    index: Arc<I>,
    embedder: Arc<E>,
    completer: Arc<C>,
    docs: &[Document],
    question: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    I: VectorIndex,
    E: EmbeddingClient,
    C: CompletionClient,
{
    let engine = AnswerEngine::new(config, index, embedder, completer)?;

    let total = engine.ingest_all(docs).await?;
    eprintln!("Ingested {} chunks from {} documents", total, docs.len());

    let answer = engine.answer(question, &[]).await?;
    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &Answer) {
    if answer.escalate {
        println!("ESCALATED: {}", answer.reason.as_deref().unwrap_or("-"));
    } else {
        println!(
            "Answer (confidence {}):\n",
            answer.confidence
        );
    }

    if let Some(response) = &answer.response {
        println!("{}", response);
    }

    if !answer.sources.is_empty() {
        println!("\nSources:");
        for source in &answer.sources {
            println!(
                "  {} ({}, relevance {:.2})",
                source.chunk_id, source.category, source.relevance
            );
        }
    }
}

fn chunk_file(
    config: &DeskbotConfig,
    path: &PathBuf,
    category: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let doc_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let doc = Document::new(
        doc_id,
        text,
        DocumentMeta::new(category, SourceKind::KbArticle),
    );

    let chunker = SectionChunker::new(config.chunking.clone())?;
    let chunks = chunker.chunk(&doc)?;

    println!("{} chunks:", chunks.len());
    for chunk in &chunks {
        let preview: String = chunk.content.chars().take(60).collect();
        println!("  {} ({} chars)  {}", chunk.id, chunk.meta.char_count, preview);
    }

    Ok(())
}

fn kb_stats(
    config: &DeskbotConfig,
    docs: &[Document],
) -> Result<(), Box<dyn std::error::Error>> {
    let chunker = SectionChunker::new(config.chunking.clone())?;

    let mut total = 0usize;
    let mut by_category: Vec<(String, usize)> = Vec::new();

    for doc in docs {
        let chunks = chunker.chunk(doc)?;
        total += chunks.len();
        match by_category.iter_mut().find(|(c, _)| *c == doc.meta.category) {
            Some((_, count)) => *count += chunks.len(),
            None => by_category.push((doc.meta.category.clone(), chunks.len())),
        }
    }

    println!("{} documents, {} chunks", docs.len(), total);
    for (category, count) in &by_category {
        println!("  {}: {}", category, count);
    }

    Ok(())
}
