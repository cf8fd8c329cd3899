//! CLI entry point for ragdesk: ingest documents, ask questions, inspect the index.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ragdesk_core::{
    app_data_dir, load_config, load_kb_articles, scan_documents, set_documents_root, set_kb_root,
    Acquired, Config, Engine, EngineSettings, OllamaClient, VectorIndex,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragdesk")]
#[command(about = "ragdesk: answer questions from your manuals and knowledge base")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ollama base URL (overrides config).
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show the models in use and what is persisted, without contacting Ollama.
    Status,
    /// Show where ragdesk stores its config and index (app data directory).
    DataDir,
    /// Print the effective configuration.
    Config,
    /// Remember default folders for `ingest`.
    Use {
        /// Folder of .txt / .md documents.
        #[arg(long, value_name = "DIR")]
        docs: Option<PathBuf>,
        /// Folder of knowledge-base JSON files.
        #[arg(long, value_name = "DIR")]
        kb: Option<PathBuf>,
    },
    /// List the documents that would be ingested from a folder.
    Scan {
        /// Folder of .txt / .md documents.
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Chunk, embed and index documents, then persist the index.
    Ingest {
        /// Folder of .txt / .md documents (defaults to `documents_root` in config).
        #[arg(long, value_name = "DIR")]
        docs: Option<PathBuf>,
        /// Folder of knowledge-base JSON files (defaults to `kb_root` in config).
        #[arg(long, value_name = "DIR")]
        kb: Option<PathBuf>,
    },
    /// Answer a question from the indexed documents.
    Ask {
        question: String,
        /// Number of chunks to retrieve (defaults to `top_k` in config).
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the {question, answer, sources} response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the chunks nearest to a question, with distances. Does not call the chat model.
    Search {
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Number of indexed chunks, embedding dimension and index location.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "ragdesk=debug,ragdesk_core=debug" } else { "ragdesk=info,ragdesk_core=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config();
    if let Some(url) = cli.url {
        config.ollama_url = url;
    }
    tracing::debug!(?config, "loaded config");

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            let index_dir = config.index_dir()?;
            println!("ollama:    {} (embed {}, chat {})", config.ollama_url, config.embed_model, config.chat_model);
            println!("index dir: {}", index_dir.display());
            match VectorIndex::peek(&index_dir)? {
                Some(stats) => println!("index:     {} chunk(s), dimension {}", stats.entries, stats.dimension),
                None => println!("index:     nothing persisted yet"),
            }
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => bail!("could not determine app data directory"),
        },
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            println!("# resolved index dir: {}", config.index_dir()?.display());
        }
        Commands::Use { docs, kb } => {
            if docs.is_none() && kb.is_none() {
                bail!("pass --docs and/or --kb");
            }
            if let Some(dir) = docs {
                set_documents_root(&dir)?;
                println!("documents_root set to {}", dir.display());
            }
            if let Some(dir) = kb {
                set_kb_root(&dir)?;
                println!("kb_root set to {}", dir.display());
            }
        }
        Commands::Scan { path } => {
            let docs = scan_documents(&path).with_context(|| format!("scanning {}", path.display()))?;
            println!("Found {} document(s) under {}", docs.len(), path.display());
            for doc in docs {
                match doc {
                    Ok(d) => {
                        let first = d.text.lines().next().unwrap_or("").trim();
                        println!("  {}  {}", d.label(), preview(first, 60));
                    }
                    Err(e) => println!("  [unreadable] {}", e),
                }
            }
        }
        Commands::Ingest { docs, kb } => {
            let docs = docs.or_else(|| config.documents_root());
            let kb = kb.or_else(|| config.kb_root());
            if docs.is_none() && kb.is_none() {
                bail!("nothing to ingest: pass --docs and/or --kb, or set documents_root / kb_root in config");
            }

            let mut acquired: Vec<Acquired> = Vec::new();
            if let Some(dir) = docs {
                acquired.extend(scan_documents(&dir).with_context(|| format!("scanning {}", dir.display()))?);
            }
            if let Some(dir) = kb {
                acquired.extend(load_kb_articles(&dir).with_context(|| format!("reading {}", dir.display()))?);
            }

            let engine = start_engine(&config).await?;
            let report = engine.ingest(acquired).await.context("ingestion failed")?;
            println!(
                "Indexed {} chunk(s) from {} document(s); index now holds {} chunk(s).",
                report.indexed_chunks, report.documents, report.total_entries
            );
            if report.empty_documents > 0 {
                println!("  {} document(s) had no text.", report.empty_documents);
            }
            for failure in &report.failures {
                println!("  skipped: {}", failure);
            }
        }
        Commands::Ask { question, top_k, json } => {
            let engine = start_engine(&config).await?;
            let answer = engine.ask(&question, top_k).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer.trim());
                if !answer.sources.is_empty() {
                    println!();
                    println!("Sources:");
                    for (i, source) in answer.sources.iter().enumerate() {
                        let title = source.title.as_deref().map(|t| format!(" ({t})")).unwrap_or_default();
                        println!("  {}. {}{} #{}", i + 1, source.source, title, source.sequence);
                    }
                }
            }
        }
        Commands::Search { question, top_k } => {
            let engine = start_engine(&config).await?;
            for hit in engine.search(&question, top_k).await? {
                println!(
                    "{:>10.4}  {} #{}  {}",
                    hit.distance,
                    hit.record.source,
                    hit.record.sequence,
                    preview(hit.record.text.trim(), 60)
                );
            }
        }
        Commands::Stats => {
            let engine = start_engine(&config).await?;
            let stats = engine.stats();
            println!("entries:   {}", stats.entries);
            println!("dimension: {}", stats.dimension);
            println!("index dir: {}", engine.settings().index_dir.display());
        }
    }
    Ok(())
}

async fn start_engine(config: &Config) -> Result<Engine> {
    let settings = EngineSettings::from_config(config)?;
    let client = Arc::new(OllamaClient::from_config(config)?);
    Engine::start(settings, client.clone(), client)
        .await
        .context("failed to start engine")
}

fn preview(text: &str, max_chars: usize) -> String {
    let line = text.replace('\n', " ");
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        line
    }
}
