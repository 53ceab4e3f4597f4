//! docrag-pipeline
//!
//! Orchestration over the core traits: ingest documents into a vector index,
//! retrieve chunks for a query, and ground a chat conversation in them.

pub mod chat;
pub mod context;
pub mod discover;
pub mod generation;
pub mod ingest;
pub mod retrieve;

pub use chat::RagChat;
pub use context::{assemble_context, ground_conversation, latest_user_message, ChatTurn, Role};
pub use discover::discover_documents;
pub use generation::{collect_text, Fragment, FragmentStream, Generator, OpenAiChatGenerator};
pub use ingest::{IngestReport, IngestionPipeline};
pub use retrieve::{RetrievalPipeline, DEFAULT_K};
