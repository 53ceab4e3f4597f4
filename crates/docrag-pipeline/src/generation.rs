//! Streaming chat completion against an OpenAI-compatible endpoint.
//!
//! The response is server-sent events; each `data:` line carries one JSON
//! chunk whose `choices[0].delta.content` is the next text fragment. Only
//! `data: [DONE]` ends the stream with `Fragment::Done`; a body that closes
//! without it yields `Error::Generation`. Dropping the returned stream stops
//! reading from the connection.

use std::ops::ControlFlow;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use docrag_core::config::{api_key_from_env, GenerationSettings};
use docrag_core::{Error, Result};

use crate::context::ChatTurn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Delta(String),
    Done,
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn stream(&self, turns: Vec<ChatTurn>) -> Result<FragmentStream>;
}

/// Drain a fragment stream into the full reply text.
pub async fn collect_text(mut stream: FragmentStream) -> Result<String> {
    let mut out = String::new();
    while let Some(item) = stream.next().await {
        match item? {
            Fragment::Delta(text) => out.push_str(&text),
            Fragment::Done => break,
        }
    }
    Ok(out)
}

pub struct OpenAiChatGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

enum SseEvent {
    Text(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(SseEvent::Done);
    }
    if payload.is_empty() {
        return Ok(SseEvent::Skip);
    }
    let chunk: ChatChunk =
        serde_json::from_str(payload).map_err(|e| Error::generation(format!("invalid stream chunk: {}", e)))?;
    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) if !text.is_empty() => Ok(SseEvent::Text(text)),
        _ => Ok(SseEvent::Skip),
    }
}

/// Parse one SSE line and pass its event on. `Break` once the stream is
/// finished, failed, or no longer consumed.
async fn forward_line(line: &[u8], tx: &mpsc::Sender<Result<Fragment>>) -> ControlFlow<()> {
    let line = String::from_utf8_lossy(line);
    match parse_sse_line(line.trim_end()) {
        Ok(SseEvent::Text(text)) => {
            if tx.send(Ok(Fragment::Delta(text))).await.is_err() {
                debug!("generation stream dropped by consumer");
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
        Ok(SseEvent::Skip) => ControlFlow::Continue(()),
        Ok(SseEvent::Done) => {
            let _ = tx.send(Ok(Fragment::Done)).await;
            ControlFlow::Break(())
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            ControlFlow::Break(())
        }
    }
}

impl OpenAiChatGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &GenerationSettings, api_key: impl Into<String>) -> Result<Self> {
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
        })
    }
}

#[async_trait]
impl Generator for OpenAiChatGenerator {
    async fn stream(&self, turns: Vec<ChatTurn>) -> Result<FragmentStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest { model: &self.model, messages: &turns, stream: true })
            .send()
            .await
            .map_err(|e| Error::generation(format!("request to {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::generation(format!("{} returned {}: {}", url, status, body)));
        }

        let (tx, rx) = mpsc::channel::<Result<Fragment>>(32);
        let mut body = Box::pin(resp.bytes_stream().map_err(|e| Error::generation(format!("stream interrupted: {}", e))));
        tokio::spawn(async move {
            let mut buf: Vec<u8> = Vec::new();
            loop {
                let bytes = match body.next().await {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                    None => break,
                };
                buf.extend_from_slice(&bytes);
                while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    if forward_line(&line, &tx).await.is_break() {
                        return;
                    }
                }
            }
            // The last event may arrive without a trailing newline.
            if !buf.is_empty() && forward_line(&buf, &tx).await.is_break() {
                return;
            }
            warn!("generation stream ended before [DONE]");
            let _ = tx.send(Err(Error::generation("stream ended before [DONE]"))).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_lines() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert!(matches!(parse_sse_line(line).unwrap(), SseEvent::Text(t) if t == "Hi"));
        assert!(matches!(parse_sse_line("data: [DONE]").unwrap(), SseEvent::Done));
        assert!(matches!(parse_sse_line(": keep-alive").unwrap(), SseEvent::Skip));
        assert!(matches!(parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(), SseEvent::Skip));
        assert!(parse_sse_line("data: {not json").is_err());
    }
}
