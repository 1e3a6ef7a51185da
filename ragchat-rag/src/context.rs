//! Retrieval context assembly.
//!
//! [`RagContextService`] runs embed → hybrid search → assemble for a prompt
//! and hands back the context string together with the documents that
//! produced it.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{RagContextResult, SearchDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, require_text};
use crate::search::HybridSearchIndex;

/// Builds retrieval context for prompts against one index.
///
/// Each call is independent; the service only holds shared client handles.
#[derive(Clone)]
pub struct RagContextService<D: SearchDocument> {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn HybridSearchIndex<D>>,
}

impl<D: SearchDocument> RagContextService<D> {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn HybridSearchIndex<D>>,
    ) -> Self {
        Self { embedding_provider, index }
    }

    /// Retrieve up to `top_k` documents for `prompt` and assemble them.
    ///
    /// The same prompt text is used for the lexical half of the query and for
    /// the embedding. Nothing partial is returned: if embedding fails the
    /// index is never queried.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`](crate::RagError::InvalidArgument) for a
    ///   blank prompt, before any network call.
    /// - Whatever the embedding provider or the index returned.
    pub async fn context_with_citations(
        &self,
        prompt: &str,
        top_k: usize,
    ) -> Result<RagContextResult<D>> {
        require_text(prompt, "Prompt")?;

        let embedding = self.embedding_provider.embed(prompt).await.map_err(|e| {
            error!(operation = "embed", prompt, error = %e, "context retrieval failed");
            e
        })?;

        let documents = self.index.hybrid_search(prompt, &embedding, top_k).await.map_err(|e| {
            error!(
                operation = "hybrid_search",
                prompt,
                top_k,
                error = %e,
                "context retrieval failed"
            );
            e
        })?;

        debug!(result_count = documents.len(), top_k, "assembled retrieval context");
        Ok(RagContextResult::from_documents(documents))
    }
}
