//! Chat orchestration with optional retrieval context.
//!
//! [`ChatOrchestrator`] renders the chat-with-context template and sends it to
//! a [`ChatCompletionModel`]. When built with a [`RagContextService`] it can
//! also run the full retrieval pipeline first:
//!
//! ```text
//! validate → embed → search → assemble → render → invoke → answer
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_rag::{ChatOrchestrator, ProjectDocument, RagContextService};
//!
//! let orchestrator = ChatOrchestrator::<ProjectDocument>::new(chat_model, &chat_config)?
//!     .with_retrieval(RagContextService::new(embedder, index));
//! let reply = orchestrator
//!     .rag_chat_completion_with_citations("What backend frameworks were used?", "gpt-4.1", 3)
//!     .await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::ChatConfig;
use crate::context::RagContextService;
use crate::document::SearchDocument;
use crate::error::{RagError, Result, require_text};
use crate::template::{CHAT_WITH_CONTEXT, PromptTemplate};

/// A hosted chat-completion model.
#[async_trait]
pub trait ChatCompletionModel: Send + Sync {
    /// Send one rendered prompt as a user turn to `deployment`.
    ///
    /// Returns `None` when the model produced no content.
    async fn complete(&self, deployment: &str, prompt: &str) -> Result<Option<String>>;
}

/// An answer together with the documents retrieved to ground it.
#[derive(Debug, Clone, PartialEq)]
pub struct RagChatResponse<D> {
    pub answer: String,
    /// Exactly what the index returned, in the same order.
    pub citations: Vec<D>,
}

/// Renders the chat template and invokes the chat model.
pub struct ChatOrchestrator<D: SearchDocument> {
    model: Arc<dyn ChatCompletionModel>,
    template: PromptTemplate,
    default_deployment: String,
    deployments: HashMap<String, String>,
    retrieval: Option<RagContextService<D>>,
}

impl<D: SearchDocument> ChatOrchestrator<D> {
    /// Create an orchestrator without retrieval.
    ///
    /// Only the deployment settings of `config` are used here; the endpoint
    /// and key belong to the model client.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if no default deployment is set.
    pub fn new(model: Arc<dyn ChatCompletionModel>, config: &ChatConfig) -> Result<Self> {
        if config.deployment.trim().is_empty() {
            return Err(RagError::invalid("OPENAI_CHAT_DEPLOYMENT is not set"));
        }
        Ok(Self {
            model,
            template: PromptTemplate::parse(CHAT_WITH_CONTEXT)?,
            default_deployment: config.deployment.clone(),
            deployments: config.deployments.clone(),
            retrieval: None,
        })
    }

    /// Attach the context service used by the RAG entry points.
    pub fn with_retrieval(mut self, retrieval: RagContextService<D>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn has_retrieval(&self) -> bool {
        self.retrieval.is_some()
    }

    /// The deployment that serves `model`, or the default deployment.
    pub fn deployment_for(&self, model: &str) -> &str {
        self.deployments.get(model).map(String::as_str).unwrap_or(&self.default_deployment)
    }

    /// Answer `prompt`, optionally grounded in `context`.
    ///
    /// Returns an empty string when the model produced no content.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] for a blank prompt.
    /// - The model client's error, after logging it.
    pub async fn chat_completion(
        &self,
        prompt: &str,
        model: &str,
        context: Option<&str>,
    ) -> Result<String> {
        if let Err(e) = require_text(prompt, "Prompt") {
            warn!("Prompt cannot be empty.");
            return Err(e);
        }
        self.invoke(prompt, model, context.unwrap_or_default()).await.map_err(|e| {
            error!(model, error = %e, "Error during chat completion.");
            e
        })
    }

    /// Retrieve context for `prompt`, then answer it. Only the answer is
    /// returned.
    pub async fn rag_chat_completion(
        &self,
        prompt: &str,
        model: &str,
        top_k: usize,
    ) -> Result<String> {
        self.rag_chat_completion_with_citations(prompt, model, top_k).await.map(|r| r.answer)
    }

    /// Retrieve context for `prompt`, answer it, and return the citations.
    ///
    /// An empty context or zero citations is logged as a warning, not an
    /// error: the pipeline ran and found nothing.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] for a blank prompt or when this
    ///   orchestrator has no retrieval configured, before any network call.
    /// - Any embedding, search, or model failure.
    pub async fn rag_chat_completion_with_citations(
        &self,
        prompt: &str,
        model: &str,
        top_k: usize,
    ) -> Result<RagChatResponse<D>> {
        if let Err(e) = require_text(prompt, "Prompt") {
            warn!("Prompt cannot be empty.");
            return Err(e);
        }
        let retrieval = self.retrieval.as_ref().ok_or_else(|| {
            RagError::invalid("retrieval is not configured for this chat service")
        })?;

        let result: Result<RagChatResponse<D>> = async {
            let context = retrieval.context_with_citations(prompt, top_k).await?;
            if context.citations.is_empty() {
                warn!(prompt, "AI Search returned no results");
            } else if context.context.trim().is_empty() {
                warn!(prompt, "AI Search returned empty context");
            } else {
                info!(prompt, count = context.citations.len(), "AI Search returned results");
            }

            let answer = self.invoke(prompt, model, &context.context).await?;
            Ok(RagChatResponse { answer, citations: context.citations })
        }
        .await;

        result.map_err(|e| {
            error!(prompt, model, error = %e, "Error during RAG chat completion.");
            e
        })
    }

    async fn invoke(&self, prompt: &str, model: &str, context: &str) -> Result<String> {
        let variables = HashMap::from([("context", context), ("user_input", prompt)]);
        let rendered = self.template.render(&variables);
        let deployment = self.deployment_for(model);
        let answer = self.model.complete(deployment, &rendered).await?;
        Ok(answer.unwrap_or_default())
    }
}
