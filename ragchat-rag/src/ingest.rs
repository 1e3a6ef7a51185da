//! Batch ingestion: embed each document, then upload the batch.
//!
//! ```rust,ignore
//! use ragchat_rag::{FailedEmbeddingPolicy, IngestionService};
//!
//! let service = IngestionService::new(embedder, index)
//!     .with_concurrency(4)
//!     .with_policy(FailedEmbeddingPolicy::Skip);
//! let report = service.ingest(projects).await?;
//! println!("{} embedded, {} failed", report.success, report.fail);
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::document::EmbeddableDocument;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::search::HybridSearchIndex;

/// What to do with a document whose embedding could not be generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailedEmbeddingPolicy {
    /// Upload it anyway, without a vector. It stays reachable by text search.
    #[default]
    UploadAnyway,
    /// Leave it out of the upload.
    Skip,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents embedded successfully.
    pub success: usize,
    /// Documents whose embedding failed.
    pub fail: usize,
    /// Documents accepted by the index.
    pub uploaded: usize,
}

/// Documents that went through embedding and are ready to upload.
#[derive(Debug, Clone)]
pub struct EmbeddedBatch<D> {
    /// In input order; under [`FailedEmbeddingPolicy::Skip`] failed
    /// documents are absent.
    pub documents: Vec<D>,
    /// Embedding counts; `uploaded` is still zero.
    pub report: IngestReport,
}

/// Embeds documents and uploads them to a hybrid index.
pub struct IngestionService<D: EmbeddableDocument> {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn HybridSearchIndex<D>>,
    policy: FailedEmbeddingPolicy,
    concurrency: usize,
}

impl<D: EmbeddableDocument> IngestionService<D> {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn HybridSearchIndex<D>>,
    ) -> Self {
        Self {
            embedding_provider,
            index,
            policy: FailedEmbeddingPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_policy(mut self, policy: FailedEmbeddingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Maximum number of embedding requests in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn policy(&self) -> FailedEmbeddingPolicy {
        self.policy
    }

    /// Embed every document, then upload the batch in input order.
    ///
    /// A failed embedding is counted and logged; it never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns the index error if the upload itself fails.
    pub async fn ingest(&self, documents: Vec<D>) -> Result<IngestReport> {
        let batch = self.embed_all(documents).await;
        self.upload(batch).await
    }

    /// Embed every document and apply the failed-embedding policy, without
    /// uploading anything.
    pub async fn embed_all(&self, documents: Vec<D>) -> EmbeddedBatch<D> {
        let total = documents.len();
        let outcomes: Vec<(D, bool)> = stream::iter(documents.into_iter().enumerate())
            .map(|(position, document)| self.embed_one(position + 1, total, document))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = IngestReport::default();
        let mut documents = Vec::with_capacity(outcomes.len());
        for (document, embedded) in outcomes {
            if embedded {
                report.success += 1;
            } else {
                report.fail += 1;
                if self.policy == FailedEmbeddingPolicy::Skip {
                    continue;
                }
            }
            documents.push(document);
        }
        EmbeddedBatch { documents, report }
    }

    /// Upload an embedded batch; an empty batch is not sent.
    ///
    /// # Errors
    ///
    /// Returns the index error if the upload fails.
    pub async fn upload(&self, batch: EmbeddedBatch<D>) -> Result<IngestReport> {
        let EmbeddedBatch { documents, mut report } = batch;
        if documents.is_empty() {
            warn!(fail = report.fail, "no documents to upload");
            return Ok(report);
        }

        report.uploaded = self.index.upload(&documents).await.map_err(|e| {
            error!(batch_size = documents.len(), error = %e, "upload failed");
            e
        })?;

        info!(
            success = report.success,
            fail = report.fail,
            uploaded = report.uploaded,
            "ingestion complete"
        );
        Ok(report)
    }

    async fn embed_one(&self, position: usize, total: usize, mut document: D) -> (D, bool) {
        let key = document.document_key().unwrap_or("<no id>").to_string();
        let input = document.embedding_input().to_string();
        if input.trim().is_empty() {
            warn!(position, total, key = %key, "no text to embed");
            return (document, false);
        }

        match self.embedding_provider.embed(&input).await {
            Ok(vector) => {
                info!(position, total, key = %key, dimensions = vector.len(), "embedded document");
                document.set_content_vector(vector);
                (document, true)
            }
            Err(e) => {
                error!(position, total, key = %key, error = %e, "failed to embed document");
                (document, false)
            }
        }
    }
}
