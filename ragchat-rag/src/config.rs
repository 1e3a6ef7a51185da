//! Configuration for the embedding, search, and chat backends.
//!
//! Each client takes exactly one of these structs. Where the values come from
//! (arguments, environment, a settings file) is decided by the caller, see
//! [`Settings`](crate::settings::Settings).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// API version used for Azure OpenAI calls when none is configured.
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-04-01-preview";

/// Embedding deployment used when none is configured.
pub const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";

/// Chat deployment used when none is configured.
pub const DEFAULT_CHAT_DEPLOYMENT: &str = "gpt-4.1";

/// API version of the Azure AI Search REST surface.
pub const SEARCH_API_VERSION: &str = "2024-03-01-Preview";

/// How the embedding client authenticates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingAuth {
    /// Send the key in an `api-key` header.
    #[default]
    ApiKey,
    /// Send the key as a bearer token.
    Bearer,
}

/// Settings for [`AzureOpenAIEmbeddingProvider`](crate::openai::AzureOpenAIEmbeddingProvider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    #[serde(default)]
    pub auth: EmbeddingAuth,
    /// Expected vector length. Responses of another length are rejected.
    #[serde(default)]
    pub dimensions: Option<usize>,
}

impl EmbeddingConfig {
    /// Create a config with the default deployment and API version.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: DEFAULT_EMBEDDING_DEPLOYMENT.to_string(),
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            auth: EmbeddingAuth::default(),
            dimensions: None,
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_auth(mut self, auth: EmbeddingAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Check that every required value is present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        require("OPENAI_ENDPOINT", &self.endpoint)?;
        require("OPENAI_API_KEY", &self.api_key)?;
        require("OPENAI_EMBEDDING_DEPLOYMENT", &self.deployment)?;
        require("OPENAI_API_VERSION", &self.api_version)?;
        if self.dimensions == Some(0) {
            return Err(RagError::invalid("embedding dimensions must be greater than zero"));
        }
        Ok(())
    }
}

/// Settings for [`AzureSearchClient`](crate::azure_search::AzureSearchClient).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Service endpoint, e.g. `https://my-search.search.windows.net`.
    pub endpoint: String,
    pub index: String,
    pub api_key: String,
    /// Name of the vector field the vector query targets.
    pub vector_field: String,
}

impl SearchConfig {
    pub fn new(
        endpoint: impl Into<String>,
        index: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            index: index.into(),
            api_key: api_key.into(),
            vector_field: "content_vector".to_string(),
        }
    }

    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        require("AZURE_SEARCH_ENDPOINT", &self.endpoint)?;
        require("AZURE_SEARCH_INDEX", &self.index)?;
        require("AZURE_SEARCH_API_KEY", &self.api_key)?;
        require("vector_field", &self.vector_field)
    }
}

/// Settings for [`AzureOpenAIChatClient`](crate::azure_chat::AzureOpenAIChatClient)
/// and the [`ChatOrchestrator`](crate::chat::ChatOrchestrator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Deployment used for any model without an explicit entry in `deployments`.
    pub deployment: String,
    pub api_version: String,
    /// Model name → deployment name overrides.
    #[serde(default)]
    pub deployments: HashMap<String, String>,
}

impl ChatConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: DEFAULT_CHAT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            deployments: HashMap::new(),
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Route requests for `model` to `deployment`.
    pub fn with_model_deployment(
        mut self,
        model: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        self.deployments.insert(model.into(), deployment.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        require("OPENAI_ENDPOINT", &self.endpoint)?;
        require("OPENAI_API_KEY", &self.api_key)?;
        require("OPENAI_CHAT_DEPLOYMENT", &self.deployment)?;
        require("OPENAI_API_VERSION", &self.api_version)
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RagError::invalid(format!("{name} is not set")));
    }
    Ok(())
}

/// Join an endpoint and a path without doubling the slash.
pub(crate) fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}
