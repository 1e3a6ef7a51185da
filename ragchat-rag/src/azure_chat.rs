//! Azure OpenAI chat-completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::chat::ChatCompletionModel;
use crate::config::{ChatConfig, join_url};
use crate::error::{RagError, Result};
use crate::openai::error_detail;

const SERVICE: &str = "AzureOpenAI.Chat";

/// A [`ChatCompletionModel`] calling Azure OpenAI deployments over REST.
///
/// One client serves every deployment of the configured resource; the
/// deployment is chosen per call.
pub struct AzureOpenAIChatClient {
    client: reqwest::Client,
    config: ChatConfig,
}

impl AzureOpenAIChatClient {
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if the configuration is incomplete.
    pub fn new(config: ChatConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: ChatConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    fn url(&self, deployment: &str) -> String {
        join_url(
            &self.config.endpoint,
            &format!(
                "openai/deployments/{deployment}/chat/completions?api-version={}",
                self.config.api_version
            ),
        )
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatCompletionModel for AzureOpenAIChatClient {
    async fn complete(&self, deployment: &str, prompt: &str) -> Result<Option<String>> {
        debug!(provider = SERVICE, deployment, prompt_len = prompt.len(), "chat completion");

        let body = ChatCompletionRequest { messages: [ChatMessage { role: "user", content: prompt }] };
        let response = self
            .client
            .post(self.url(deployment))
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = SERVICE, deployment, error = %e, "request failed");
                RagError::unavailable(SERVICE, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = SERVICE, deployment, %status, "API error");
            return Err(RagError::unavailable(SERVICE, format!("API returned {status}: {detail}")));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(provider = SERVICE, error = %e, "failed to parse response");
            RagError::malformed(SERVICE, format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.choices.into_iter().next().and_then(|choice| choice.message.content))
    }
}
