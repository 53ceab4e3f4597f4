use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Embedding, Meta};

/// An embedding model reachable through one request per batch.
///
/// Implementations must be deterministic per item: the vector for a text may
/// not depend on which other texts share its request.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// One upstream call. Returns one vector per input, in input order.
    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// Upsert-by-id and nearest-neighbour query over embeddings.
///
/// A batch passed to `upsert` becomes visible to readers all at once.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// All four slices must be equal length and index-aligned.
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Embedding],
        documents: &[String],
        metadatas: &[Meta],
    ) -> Result<()>;

    /// Documents of the `k` nearest entries, most similar first.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<String>>;

    /// Remove entries whose `source` metadata equals `source` and whose id is
    /// not listed in `keep_ids`. Returns the number of removed entries.
    async fn delete_stale(&self, source: &str, keep_ids: &[String]) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}

pub trait TextExtractor: Send + Sync {
    /// Full document text, pages concatenated in order.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Rejects upserts whose parallel slices disagree in length.
pub fn check_aligned(ids: &[String], vectors: &[Embedding], documents: &[String], metadatas: &[Meta]) -> Result<()> {
    let n = ids.len();
    if vectors.len() != n || documents.len() != n || metadatas.len() != n {
        return Err(crate::error::Error::index(format!(
            "misaligned upsert: {} ids, {} vectors, {} documents, {} metadatas",
            n,
            vectors.len(),
            documents.len(),
            metadatas.len()
        )));
    }
    Ok(())
}
