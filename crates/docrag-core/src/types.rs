//! Domain types shared by the ingestion and retrieval pipelines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;
pub type Embedding = Vec<f32>;

/// Metadata key carrying the source path of a chunk.
pub const SOURCE_KEY: &str = "source";

/// A bounded piece of a document's extracted text; the unit of embedding and
/// retrieval.
///
/// - `id`: `"<basename(source)>_<sequence_index>"`, stable across re-ingestion
/// - `text`: trimmed, never empty
/// - `source`: the path the document was ingested from
/// - `sequence_index`: zero-based position in chunk emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub sequence_index: usize,
}

impl Chunk {
    pub fn new(source: &Path, sequence_index: usize, text: String) -> Self {
        Self {
            id: chunk_id(source, sequence_index),
            text,
            source: source.to_string_lossy().into_owned(),
            sequence_index,
        }
    }

    /// Metadata stored alongside the vector.
    pub fn metadata(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert(SOURCE_KEY.to_string(), self.source.clone());
        meta
    }
}

/// Persisted id convention. Re-ingesting the same path overwrites the same ids.
pub fn chunk_id(source: &Path, sequence_index: usize) -> ChunkId {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string_lossy().into_owned());
    format!("{}_{}", base, sequence_index)
}

/// Similarity metric a vector index ranks by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    Dot,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self { Self::Cosine => "cosine", Self::L2 => "l2", Self::Dot => "dot" };
        f.write_str(s)
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclidean" => Ok(Self::L2),
            "dot" => Ok(Self::Dot),
            other => Err(Error::config(format!("unknown distance metric '{}'", other))),
        }
    }
}
