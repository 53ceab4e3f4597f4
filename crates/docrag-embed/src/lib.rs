//! docrag-embed
//!
//! `EmbeddingProvider` partitions texts into request-sized batches over any
//! `Embedder` and reassembles the vectors in input order. Backends:
//! `OpenAiEmbedder` (HTTP) and `FakeEmbedder` (deterministic, offline).

pub mod batch;
pub mod fake;
pub mod openai;

use std::sync::Arc;

use tracing::info;

use docrag_core::config::{EmbeddingBackend, EmbeddingSettings};
use docrag_core::traits::Embedder;
use docrag_core::Result;

pub use batch::EmbeddingProvider;
pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

/// `APP_USE_FAKE_EMBEDDINGS=1` forces the fake backend regardless of config.
pub fn fake_forced_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_forced_by_env() || settings.backend == EmbeddingBackend::Fake {
        info!(dim = settings.dim, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dim)));
    }
    let embedder = OpenAiEmbedder::new(settings)?;
    info!(model = %settings.model, base_url = %settings.base_url, "using OpenAI-compatible embedder");
    Ok(Arc::new(embedder))
}
