//! docrag-vector
//!
//! `VectorIndex` implementations: `LanceVectorIndex` persists entries in a
//! LanceDB table; `MemoryVectorIndex` keeps them in process.

pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use docrag_core::config::{resolve_with_base, IndexBackend, IndexSettings};
use docrag_core::traits::{check_aligned, VectorIndex};
use docrag_core::types::{Embedding, Meta};
use docrag_core::Result;

pub use memory::MemoryVectorIndex;
pub use writer::LanceVectorIndex;

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn upsert(&self, ids: &[String], vectors: &[Embedding], documents: &[String], metadatas: &[Meta]) -> Result<()> {
        check_aligned(ids, vectors, documents, metadatas)?;
        self.merge_rows(ids, vectors, documents, metadatas).await
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<String>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.nearest_documents(vector, k).await
    }

    async fn delete_stale(&self, source: &str, keep_ids: &[String]) -> Result<usize> {
        self.delete_rows_not_in(source, keep_ids).await
    }

    async fn count(&self) -> Result<usize> { self.row_count().await }
}

/// Build the configured index. Relative LanceDB URIs resolve against `base`.
pub async fn open_index(settings: &IndexSettings, dim: usize, base: &Path) -> Result<Arc<dyn VectorIndex>> {
    match settings.backend {
        IndexBackend::LanceDb => {
            let path = resolve_with_base(base, &settings.uri);
            let index = LanceVectorIndex::open(&path, &settings.table, dim, settings.metric).await?;
            Ok(Arc::new(index))
        }
        IndexBackend::Memory => {
            info!(metric = %settings.metric, "using in-memory index");
            Ok(Arc::new(MemoryVectorIndex::new(settings.metric)))
        }
    }
}
