//! Document ingestion: extract → chunk → embed → upsert.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use docrag_core::config::RagSettings;
use docrag_core::traits::{Embedder, TextExtractor, VectorIndex};
use docrag_core::{Chunker, Error, Result};
use docrag_embed::EmbeddingProvider;

/// Outcome of a multi-document run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents processed without error, including ones with no text.
    pub documents: usize,
    pub chunks: usize,
    /// Unreadable documents and the reason they were skipped.
    pub skipped: Vec<(PathBuf, String)>,
}

pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: Chunker,
    embedder: EmbeddingProvider,
    index: Arc<dyn VectorIndex>,
    prune_stale: bool,
}

impl IngestionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: Chunker,
        embedder: EmbeddingProvider,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self { extractor, chunker, embedder, index, prune_stale: false }
    }

    pub fn from_settings(
        settings: &RagSettings,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        settings.validate()?;
        let provider = EmbeddingProvider::new(embedder, settings.batch_size, settings.max_concurrent_batches)?;
        Ok(Self::new(extractor, settings.chunker()?, provider, index).with_pruning(settings.prune_stale))
    }

    /// After each upsert, delete this document's ids beyond the new chunk count.
    pub fn with_pruning(mut self, prune_stale: bool) -> Self {
        self.prune_stale = prune_stale;
        self
    }

    /// Ingest one document and return the number of chunks written.
    ///
    /// A document with no text is valid input: it yields 0 and touches nothing.
    /// Without pruning, re-ingesting a document that shrank leaves its old
    /// trailing chunks in the index.
    pub async fn ingest(&self, path: &Path) -> Result<usize> {
        let started = Instant::now();
        let text = self.extract(path).await?;
        let chunks = self.chunker.chunks_for(path, &text);
        if chunks.is_empty() {
            info!(path = %path.display(), "no text to index");
            return Ok(0);
        }

        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        let documents: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let metadatas: Vec<_> = chunks.iter().map(|c| c.metadata()).collect();

        let vectors = self.embedder.embed_batch(&documents).await?;
        self.index.upsert(&ids, &vectors, &documents, &metadatas).await?;

        if self.prune_stale {
            let removed = self.index.delete_stale(&chunks[0].source, &ids).await?;
            if removed > 0 {
                info!(path = %path.display(), removed, "pruned stale chunks");
            }
        }

        info!(
            path = %path.display(),
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ingested document"
        );
        Ok(chunks.len())
    }

    /// Ingest documents one at a time. Unreadable documents are skipped and
    /// reported; any other failure stops the run.
    pub async fn ingest_all(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        if paths.is_empty() {
            return Ok(report);
        }
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        for path in paths {
            pb.set_message(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
            match self.ingest(path).await {
                Ok(n) => {
                    report.documents += 1;
                    report.chunks += n;
                }
                Err(e) if e.is_document_local() => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    report.skipped.push((path.clone(), e.to_string()));
                }
                Err(e) => {
                    pb.abandon_with_message(format!("failed on {}", path.display()));
                    return Err(e);
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("done");
        info!(documents = report.documents, chunks = report.chunks, skipped = report.skipped.len(), "ingestion run complete");
        Ok(report)
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let extractor = self.extractor.clone();
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| Error::document_read(path, format!("extraction task failed: {}", e)))??;
        debug!(path = %path.display(), chars = text.chars().count(), "extracted text");
        Ok(text)
    }
}
