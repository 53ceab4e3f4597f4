//! In-process vector index.
//!
//! Brute-force scan over every entry; fine for tests, development, and small
//! corpora. A batch upsert is applied under one write lock, so readers see
//! either none or all of it.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use docrag_core::traits::{check_aligned, VectorIndex};
use docrag_core::types::{DistanceMetric, Embedding, Meta, SOURCE_KEY};
use docrag_core::{Error, Result};

#[derive(Debug, Clone)]
struct Entry {
    vector: Embedding,
    document: String,
    metadata: Meta,
}

#[derive(Debug, Default)]
struct State {
    dim: Option<usize>,
    entries: HashMap<String, Entry>,
}

#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    metric: DistanceMetric,
    state: RwLock<State>,
}

impl MemoryVectorIndex {
    pub fn new(metric: DistanceMetric) -> Self { Self { metric, state: RwLock::new(State::default()) } }

    /// Stored document for `id`, if any.
    pub fn document(&self, id: &str) -> Option<String> {
        self.state.read().ok()?.entries.get(id).map(|e| e.document.clone())
    }

    /// Stored metadata for `id`, if any.
    pub fn metadata(&self, id: &str) -> Option<Meta> {
        self.state.read().ok()?.entries.get(id).map(|e| e.metadata.clone())
    }

    /// All ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = match self.state.read() {
            Ok(state) => state.entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        ids.sort();
        ids
    }
}

/// Higher is more similar for every metric.
fn similarity(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match metric {
        DistanceMetric::Dot => dot,
        DistanceMetric::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
        }
        DistanceMetric::L2 => -a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>(),
    }
}

fn poisoned() -> Error { Error::index("in-memory index lock poisoned") }

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, ids: &[String], vectors: &[Embedding], documents: &[String], metadatas: &[Meta]) -> Result<()> {
        check_aligned(ids, vectors, documents, metadatas)?;
        if ids.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let dim = state.dim.unwrap_or(vectors[0].len());
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::index(format!("dim mismatch: got {} expected {}", bad.len(), dim)));
        }
        state.dim = Some(dim);
        for (((id, vector), document), metadata) in ids.iter().zip(vectors).zip(documents).zip(metadatas) {
            state.entries.insert(
                id.clone(),
                Entry { vector: vector.clone(), document: document.clone(), metadata: metadata.clone() },
            );
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<String>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        if let Some(dim) = state.dim {
            if vector.len() != dim {
                return Err(Error::index(format!("query dim mismatch: got {} expected {}", vector.len(), dim)));
            }
        }
        let mut scored: Vec<(f32, &str, &str)> = state
            .entries
            .iter()
            .map(|(id, e)| (similarity(self.metric, vector, &e.vector), id.as_str(), e.document.as_str()))
            .collect();
        // Ties break on id so rankings are reproducible.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(b.1)));
        Ok(scored.into_iter().take(k).map(|(_, _, doc)| doc.to_string()).collect())
    }

    async fn delete_stale(&self, source: &str, keep_ids: &[String]) -> Result<usize> {
        let keep: HashSet<&str> = keep_ids.iter().map(String::as_str).collect();
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let before = state.entries.len();
        state.entries.retain(|id, e| {
            e.metadata.get(SOURCE_KEY).map(String::as_str) != Some(source) || keep.contains(id.as_str())
        });
        Ok(before - state.entries.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().map_err(|_| poisoned())?.entries.len())
    }
}
