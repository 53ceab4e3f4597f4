use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use docrag_core::config::{resolve_with_base, Config, Settings};
use docrag_core::traits::{Embedder, VectorIndex};
use docrag_embed::{build_embedder, EmbeddingProvider};
use docrag_pipeline::{
    discover_documents, ChatTurn, Fragment, IngestionPipeline, OpenAiChatGenerator, RagChat, RetrievalPipeline,
};
use docrag_text::ExtensionExtractor;
use docrag_vector::open_index;

#[derive(Parser)]
#[command(name = "docrag", about = "Ingest documents and answer questions grounded in them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a document or every matching document under a directory.
    Ingest {
        /// Defaults to `data.documents_dir`.
        path: Option<PathBuf>,
    },
    /// Print the chunks nearest to a query.
    Query {
        text: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Answer a question using retrieved chunks as context.
    Ask {
        text: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
}

struct App {
    settings: Settings,
    base: PathBuf,
    embedder: EmbeddingProvider,
    index: Arc<dyn VectorIndex>,
}

impl App {
    async fn open() -> anyhow::Result<Self> {
        let base = std::env::current_dir().context("resolving working directory")?;
        let settings = Config::load_in(&base)?.settings()?;
        let inner = build_embedder(&settings.embedding)?;
        let embedder = EmbeddingProvider::new(inner.clone(), settings.rag.batch_size, settings.rag.max_concurrent_batches)?;
        let index = open_index(&settings.index, inner.dim(), &base).await?;
        Ok(Self { settings, base, embedder, index })
    }

    fn retrieval(&self, k: Option<usize>) -> anyhow::Result<RetrievalPipeline> {
        let k = k.unwrap_or(self.settings.rag.k);
        Ok(RetrievalPipeline::new(self.embedder.clone(), self.index.clone()).with_default_k(k)?)
    }
}

async fn ingest(app: &App, path: Option<PathBuf>) -> anyhow::Result<()> {
    let root = path.unwrap_or_else(|| resolve_with_base(&app.base, &app.settings.data.documents_dir));
    let paths = discover_documents(&root, &app.settings.data.extensions)?;
    if paths.is_empty() {
        println!("No documents found under {}", root.display());
        return Ok(());
    }
    println!("Ingesting {} documents from {}", paths.len(), root.display());
    let pipeline = IngestionPipeline::new(
        Arc::new(ExtensionExtractor::new()),
        app.settings.rag.chunker()?,
        app.embedder.clone(),
        app.index.clone(),
    )
    .with_pruning(app.settings.rag.prune_stale);
    let report = pipeline.ingest_all(&paths).await?;
    println!("✅ Ingested {} documents ({} chunks)", report.documents, report.chunks);
    for (path, reason) in &report.skipped {
        println!("⚠️  Skipped {}: {}", display_name(path), reason);
    }
    println!("📊 Index now holds {} chunks", app.index.count().await?);
    Ok(())
}

async fn query(app: &App, text: &str, k: Option<usize>) -> anyhow::Result<()> {
    let retrieval = app.retrieval(k)?;
    let chunks = retrieval.retrieve_default(text).await?;
    if chunks.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, chunk) in chunks.iter().enumerate() {
        println!("{:>2}. {}\n", i + 1, chunk.replace('\n', " "));
    }
    Ok(())
}

async fn ask(app: &App, text: &str, k: Option<usize>) -> anyhow::Result<()> {
    let generator = OpenAiChatGenerator::new(&app.settings.generation)?;
    let chat = RagChat::new(app.retrieval(k)?, Arc::new(generator));
    let mut stream = chat.answer(&[ChatTurn::user(text)]).await?;
    let mut stdout = std::io::stdout();
    while let Some(fragment) = stream.next().await {
        match fragment? {
            Fragment::Delta(delta) => {
                stdout.write_all(delta.as_bytes())?;
                stdout.flush()?;
            }
            Fragment::Done => break,
        }
    }
    writeln!(stdout)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::open().await?;
    match cli.command {
        Command::Ingest { path } => ingest(&app, path).await,
        Command::Query { text, k } => query(&app, &text, k).await,
        Command::Ask { text, k } => ask(&app, &text, k).await,
    }
}
