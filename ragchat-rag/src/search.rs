//! Hybrid search index trait.

use async_trait::async_trait;

use crate::document::SearchDocument;
use crate::error::Result;

/// A document index supporting batch upserts and combined lexical + vector
/// queries.
///
/// Ranking fusion belongs to the backend. Callers get documents in the order
/// the backend ranked them and must not re-sort.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::{HybridSearchIndex, ProjectDocument};
///
/// index.upload(&documents).await?;
/// let hits: Vec<ProjectDocument> = index.hybrid_search("rust services", &vector, 3).await?;
/// ```
#[async_trait]
pub trait HybridSearchIndex<D: SearchDocument>: Send + Sync {
    /// Upsert a batch of documents. Documents without a key are skipped.
    ///
    /// Returns the number of documents sent to the backend.
    async fn upload(&self, documents: &[D]) -> Result<usize>;

    /// Run one hybrid query and return at most `top_k` documents in backend
    /// ranking order.
    async fn hybrid_search(&self, query: &str, vector: &[f32], top_k: usize) -> Result<Vec<D>>;
}
