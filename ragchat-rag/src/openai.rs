//! Azure OpenAI embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{EmbeddingAuth, EmbeddingConfig, join_url};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, require_text};

const SERVICE: &str = "AzureOpenAI.Embeddings";

/// An [`EmbeddingProvider`] backed by an Azure OpenAI embedding deployment.
///
/// Calls `{endpoint}/openai/deployments/{deployment}/embeddings` with
/// `reqwest`. The client handle is cheap to share; wrap the provider in an
/// `Arc` and use it from as many tasks as needed.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::{EmbeddingConfig, openai::AzureOpenAIEmbeddingProvider};
///
/// let config = EmbeddingConfig::new("https://my.openai.azure.com", "key");
/// let provider = AzureOpenAIEmbeddingProvider::new(config)?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct AzureOpenAIEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    config: EmbeddingConfig,
}

impl AzureOpenAIEmbeddingProvider {
    /// Create a provider from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if the configuration is incomplete.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a provider that reuses an existing HTTP client.
    pub fn with_client(config: EmbeddingConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        let url = join_url(
            &config.endpoint,
            &format!(
                "openai/deployments/{}/embeddings?api-version={}",
                config.deployment, config.api_version
            ),
        );
        Ok(Self { client, url, config })
    }

    pub fn deployment(&self) -> &str {
        &self.config.deployment
    }
}

// ── Azure OpenAI request/response types ────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the service's error message out of a failure body, if it has one.
pub(crate) fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        require_text(text, "Input text for embedding")?;

        debug!(
            provider = SERVICE,
            deployment = %self.config.deployment,
            text_len = text.len(),
            "embedding text"
        );

        let request_body = EmbeddingRequest { input: text, model: &self.config.deployment };
        let request = self.client.post(&self.url).json(&request_body);
        let request = match self.config.auth {
            EmbeddingAuth::ApiKey => request.header("api-key", &self.config.api_key),
            EmbeddingAuth::Bearer => request.bearer_auth(&self.config.api_key),
        };

        let response = request.send().await.map_err(|e| {
            error!(provider = SERVICE, error = %e, "request failed");
            RagError::unavailable(SERVICE, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = SERVICE, %status, "API error");
            return Err(RagError::unavailable(SERVICE, format!("API returned {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = SERVICE, error = %e, "failed to parse response");
            RagError::malformed(SERVICE, format!("failed to parse response: {e}"))
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::malformed(SERVICE, "no embedding data returned"))?;

        if let Some(expected) = self.config.dimensions {
            if embedding.len() != expected {
                return Err(RagError::malformed(
                    SERVICE,
                    format!("expected {expected} dimensions, got {}", embedding.len()),
                ));
            }
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> Option<usize> {
        self.config.dimensions
    }
}
