//! # ragchat-rag
//!
//! Retrieval-augmented chat over a hybrid (text + vector) search index.
//!
//! ## Overview
//!
//! A prompt is embedded, used for a hybrid query against the index, the top
//! documents are assembled into a context string, and the context plus the
//! prompt are rendered into a chat template and sent to a chat model. The
//! documents that produced the context are returned as citations.
//!
//! - [`AzureOpenAIEmbeddingProvider`] - embeddings from an Azure OpenAI deployment
//! - [`AzureSearchClient`] - hybrid search and indexing on Azure AI Search
//! - [`InMemoryHybridIndex`] - local index with the same contract, for tests
//! - [`RagContextService`] - embed → search → assemble
//! - [`ChatOrchestrator`] - template rendering and chat completion
//! - [`AzureOpenAIChatClient`] - chat completions from Azure OpenAI
//! - [`IngestionService`] - embed-and-upload for document batches
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_rag::*;
//!
//! let settings = Settings::from_env();
//! let embedder = Arc::new(AzureOpenAIEmbeddingProvider::new(settings.embedding_config()?)?);
//! let index = Arc::new(AzureSearchClient::new(settings.search_config()?)?);
//! let chat_config = settings.chat_config()?;
//! let model = Arc::new(AzureOpenAIChatClient::new(chat_config.clone())?);
//!
//! let chat = ChatOrchestrator::<ProjectDocument>::new(model, &chat_config)?
//!     .with_retrieval(RagContextService::new(embedder, index));
//! let reply = chat
//!     .rag_chat_completion_with_citations("Which projects used Rust?", "gpt-4.1", 3)
//!     .await?;
//! ```

pub mod azure_chat;
pub mod azure_search;
pub mod chat;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod inmemory;
pub mod model;
pub mod openai;
pub mod search;
pub mod settings;
pub mod template;

pub use azure_chat::AzureOpenAIChatClient;
pub use azure_search::AzureSearchClient;
pub use chat::{ChatCompletionModel, ChatOrchestrator, RagChatResponse};
pub use config::{ChatConfig, EmbeddingAuth, EmbeddingConfig, SearchConfig};
pub use context::RagContextService;
pub use document::{
    ChatRequest, EmbeddableDocument, ProjectDocument, RagContextResult, SearchDocument,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use ingest::{EmbeddedBatch, FailedEmbeddingPolicy, IngestReport, IngestionService};
pub use inmemory::InMemoryHybridIndex;
pub use model::AvailableModel;
pub use openai::AzureOpenAIEmbeddingProvider;
pub use search::HybridSearchIndex;
pub use settings::Settings;
pub use template::PromptTemplate;
