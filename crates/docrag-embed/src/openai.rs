//! OpenAI-compatible embeddings client.
//!
//! Works with any server exposing `POST {base_url}/embeddings` in the OpenAI
//! wire format. One `embed_request` is one HTTP call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docrag_core::config::{api_key_from_env, EmbeddingSettings};
use docrag_core::traits::Embedder;
use docrag_core::types::Embedding;
use docrag_core::{Error, Result};

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
    id: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// API key is read from the env var named by `settings.api_key_env`.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &EmbeddingSettings, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.into(),
            dim: settings.dim,
            id: format!("openai:{}:d{}", settings.model, settings.dim),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let url = format!("{}/embeddings", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("request to {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::embedding(format!("{} returned {}: {}", url, status, body)));
        }

        let mut parsed: EmbeddingResponse =
            resp.json().await.map_err(|e| Error::embedding(format!("invalid embeddings response: {}", e)))?;
        // The API does not promise `data` is in input order; `index` is authoritative.
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
