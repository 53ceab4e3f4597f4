use std::sync::Arc;

use tracing::{debug, info};

use docrag_core::Result;

use crate::context::{ground_conversation, latest_user_message, ChatTurn};
use crate::generation::{FragmentStream, Generator};
use crate::retrieve::RetrievalPipeline;

/// Retrieval-grounded chat: the latest user message is the retrieval query,
/// and the retrieved chunks ride along as one system turn.
pub struct RagChat {
    retrieval: RetrievalPipeline,
    generator: Arc<dyn Generator>,
}

impl RagChat {
    pub fn new(retrieval: RetrievalPipeline, generator: Arc<dyn Generator>) -> Self {
        Self { retrieval, generator }
    }

    /// Fails with `Error::Configuration` when `k` is zero.
    pub fn with_k(mut self, k: usize) -> Result<Self> {
        self.retrieval = self.retrieval.with_default_k(k)?;
        Ok(self)
    }

    /// Turns that would be sent to the generator for `conversation`.
    pub async fn grounded_turns(&self, conversation: &[ChatTurn]) -> Result<Vec<ChatTurn>> {
        let query = latest_user_message(conversation);
        if query.trim().is_empty() {
            debug!("no user message to retrieve for");
            return Ok(conversation.to_vec());
        }
        let chunks = self.retrieval.retrieve_default(query).await?;
        info!(k = self.retrieval.default_k(), hits = chunks.len(), "grounding conversation");
        Ok(ground_conversation(conversation, &chunks))
    }

    pub async fn answer(&self, conversation: &[ChatTurn]) -> Result<FragmentStream> {
        let turns = self.grounded_turns(conversation).await?;
        self.generator.stream(turns).await
    }
}
