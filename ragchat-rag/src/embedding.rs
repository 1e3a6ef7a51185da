//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates a vector embedding for one piece of text.
///
/// Implementations make exactly one backend round trip per call; there is no
/// retry or caching at this layer. Empty or whitespace-only input is rejected
/// with [`RagError::InvalidArgument`](crate::RagError::InvalidArgument)
/// before any call is made.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::EmbeddingProvider;
///
/// let vector = provider.embed("What backend frameworks were used?").await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors this provider produces, when known up front.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
