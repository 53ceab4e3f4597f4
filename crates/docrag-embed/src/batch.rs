use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use docrag_core::traits::Embedder;
use docrag_core::types::Embedding;
use docrag_core::{Error, Result};

pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Batching front-end over an [`Embedder`].
///
/// Batching only respects upstream request-size limits; it never changes the
/// vectors. Output is length- and order-preserving, and a failed batch fails
/// the whole call so callers never see ids paired with the wrong vectors.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: Arc<dyn Embedder>,
    batch_size: usize,
    max_concurrent_batches: usize,
}

impl EmbeddingProvider {
    pub fn new(inner: Arc<dyn Embedder>, batch_size: usize, max_concurrent_batches: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        if max_concurrent_batches == 0 {
            return Err(Error::config("max_concurrent_batches must be greater than zero"));
        }
        Ok(Self { inner, batch_size, max_concurrent_batches })
    }

    /// Default batch size, one batch in flight.
    pub fn with_defaults(inner: Arc<dyn Embedder>) -> Self {
        Self { inner, batch_size: DEFAULT_BATCH_SIZE, max_concurrent_batches: 1 }
    }

    pub fn embedder_id(&self) -> &str { self.inner.embedder_id() }

    pub fn dim(&self) -> usize { self.inner.dim() }

    pub fn batch_size(&self) -> usize { self.batch_size }

    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.request(0, &[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| Error::embedding("empty response for single text"))
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.embed_batch_with(texts, self.batch_size).await
    }

    /// Embed `texts` in contiguous batches of at most `batch_size`.
    pub async fn embed_batch_with(&self, texts: &[String], batch_size: usize) -> Result<Vec<Embedding>> {
        if batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // `buffered` yields results in submission order, however many are in flight.
        let batches: Vec<Vec<Embedding>> = stream::iter(texts.chunks(batch_size).enumerate())
            .map(|(n, batch)| self.request(n, batch))
            .buffered(self.max_concurrent_batches)
            .try_collect()
            .await?;

        let vectors: Vec<Embedding> = batches.into_iter().flatten().collect();
        debug_assert_eq!(vectors.len(), texts.len());
        Ok(vectors)
    }

    async fn request(&self, n: usize, batch: &[String]) -> Result<Vec<Embedding>> {
        debug!(batch = n, size = batch.len(), embedder = self.inner.embedder_id(), "embedding batch");
        let vectors = self.inner.embed_request(batch).await.map_err(|e| match e {
            Error::EmbeddingProvider(_) => e,
            other => Error::embedding(other),
        })?;
        if vectors.len() != batch.len() {
            return Err(Error::embedding(format!(
                "batch {} returned {} vectors for {} texts",
                n,
                vectors.len(),
                batch.len()
            )));
        }
        let dim = self.inner.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::embedding(format!("dim mismatch: got {} expected {}", bad.len(), dim)));
        }
        Ok(vectors)
    }
}
