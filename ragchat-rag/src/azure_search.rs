//! Azure AI Search backend for [`HybridSearchIndex`].
//!
//! Both operations go through the REST surface directly. Hybrid queries are
//! sent as a single `docs/search` request carrying the text query and the
//! vector query together, so the service's own rank fusion decides the order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::{SEARCH_API_VERSION, SearchConfig, join_url};
use crate::document::SearchDocument;
use crate::error::{RagError, Result};
use crate::search::HybridSearchIndex;

const SERVICE: &str = "AzureAISearch";

/// Client for one Azure AI Search index.
///
/// Stateless apart from the HTTP client and credentials; share it through an
/// `Arc` across concurrent requests.
pub struct AzureSearchClient {
    client: reqwest::Client,
    config: SearchConfig,
    search_url: String,
    index_url: String,
}

impl AzureSearchClient {
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if the configuration is incomplete.
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: SearchConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        let base = join_url(&config.endpoint, &format!("indexes/{}/docs", config.index));
        Ok(Self {
            client,
            search_url: format!("{base}/search?api-version={SEARCH_API_VERSION}"),
            index_url: format!("{base}/index?api-version={SEARCH_API_VERSION}"),
            config,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.config.index
    }
}

// ── REST request/response types ────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    vector_queries: [VectorQuery<'a>; 1],
    top: usize,
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    vector: &'a [f32],
    fields: &'a str,
    k: usize,
    kind: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct IndexBatch<'a, D> {
    value: Vec<IndexAction<'a, D>>,
}

#[derive(Serialize)]
struct IndexAction<'a, D> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    document: &'a D,
}

#[derive(Deserialize)]
struct IndexResponse {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
}

#[async_trait]
impl<D: SearchDocument> HybridSearchIndex<D> for AzureSearchClient {
    async fn upload(&self, documents: &[D]) -> Result<usize> {
        let actions: Vec<IndexAction<'_, D>> = documents
            .iter()
            .filter(|doc| doc.document_key().is_some())
            .map(|document| IndexAction { action: "upload", document })
            .collect();

        let skipped = documents.len() - actions.len();
        if skipped > 0 {
            debug!(backend = SERVICE, skipped, "skipping documents without a key");
        }
        if actions.is_empty() {
            debug!(backend = SERVICE, "nothing to upload");
            return Ok(0);
        }

        let count = actions.len();
        debug!(backend = SERVICE, index = %self.config.index, count, "uploading batch");

        let response = self
            .client
            .post(&self.index_url)
            .header("api-key", &self.config.api_key)
            .json(&IndexBatch { value: actions })
            .send()
            .await
            .map_err(|e| {
                error!(backend = SERVICE, error = %e, "indexing request failed");
                RagError::unavailable(SERVICE, format!("indexing request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // 207 means at least one item was rejected.
        if !status.is_success() || status.as_u16() == 207 {
            let failed = serde_json::from_str::<IndexResponse>(&body)
                .map(|r| describe_failures(&r.value))
                .unwrap_or_default();
            error!(backend = SERVICE, %status, failed = %failed, "indexing rejected");
            let detail = if failed.is_empty() { body } else { failed };
            return Err(RagError::IndexingFailed(format!(
                "Azure AI Search indexing failed with status {status}: {detail}"
            )));
        }

        if let Ok(parsed) = serde_json::from_str::<IndexResponse>(&body) {
            let failed = describe_failures(&parsed.value);
            if !failed.is_empty() {
                error!(backend = SERVICE, failed = %failed, "indexing rejected items");
                return Err(RagError::IndexingFailed(format!(
                    "Azure AI Search indexing failed: {failed}"
                )));
            }
        }

        info!(backend = SERVICE, index = %self.config.index, count, "uploaded batch");
        Ok(count)
    }

    async fn hybrid_search(&self, query: &str, vector: &[f32], top_k: usize) -> Result<Vec<D>> {
        if top_k == 0 {
            return Err(RagError::invalid("top_k must be greater than zero"));
        }
        if vector.is_empty() {
            return Err(RagError::invalid("query vector cannot be empty"));
        }

        let request_body = SearchRequest {
            search: query,
            vector_queries: [VectorQuery {
                vector,
                fields: &self.config.vector_field,
                k: top_k,
                kind: "vector",
            }],
            top: top_k,
        };

        debug!(
            backend = SERVICE,
            url = %self.search_url,
            api_key = "***",
            query,
            dimensions = vector.len(),
            top_k,
            "hybrid search request"
        );

        let response = self
            .client
            .post(&self.search_url)
            .header("api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = SERVICE, error = %e, "search request failed");
                RagError::unavailable(SERVICE, format!("search request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            RagError::unavailable(SERVICE, format!("failed to read search response: {e}"))
        })?;

        if !status.is_success() {
            error!(backend = SERVICE, %status, body = %body, "hybrid search failed");
            return Err(RagError::SearchFailed { status: status.as_u16(), body });
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            error!(backend = SERVICE, error = %e, "failed to parse search response");
            RagError::malformed(SERVICE, format!("failed to parse search response: {e}"))
        })?;

        let mut documents = parsed
            .value
            .into_iter()
            .enumerate()
            .map(|(position, hit)| {
                serde_json::from_value::<D>(hit).map_err(|e| {
                    RagError::malformed(SERVICE, format!("result {position} is not a document: {e}"))
                })
            })
            .collect::<Result<Vec<D>>>()?;

        documents.truncate(top_k);
        debug!(backend = SERVICE, result_count = documents.len(), "hybrid search completed");
        Ok(documents)
    }
}

fn describe_failures(results: &[IndexingResult]) -> String {
    results
        .iter()
        .filter(|r| !r.status)
        .map(|r| match &r.error_message {
            Some(message) => format!("{}: {message}", r.key),
            None => r.key.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
