use std::sync::Arc;

use tracing::debug;

use docrag_core::traits::VectorIndex;
use docrag_core::{Error, Result};
use docrag_embed::EmbeddingProvider;

pub const DEFAULT_K: usize = 4;

/// Query text → nearest chunk texts, most relevant first.
#[derive(Clone)]
pub struct RetrievalPipeline {
    embedder: EmbeddingProvider,
    index: Arc<dyn VectorIndex>,
    default_k: usize,
}

impl RetrievalPipeline {
    pub fn new(embedder: EmbeddingProvider, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index, default_k: DEFAULT_K }
    }

    pub fn with_default_k(mut self, k: usize) -> Result<Self> {
        check_k(k)?;
        self.default_k = k;
        Ok(self)
    }

    pub fn default_k(&self) -> usize { self.default_k }

    /// Up to `k` chunk texts in the index's rank order. An empty index gives
    /// an empty result, not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        check_k(k)?;
        let vector = self.embedder.embed(query).await?;
        let chunks = self.index.query(&vector, k).await?;
        debug!(k, hits = chunks.len(), "retrieved chunks");
        Ok(chunks)
    }

    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<String>> { self.retrieve(query, self.default_k).await }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::config("k must be greater than zero"));
    }
    Ok(())
}
