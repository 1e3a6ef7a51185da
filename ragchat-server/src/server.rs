use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ragchat_rag::{
    AvailableModel, AzureOpenAIChatClient, AzureOpenAIEmbeddingProvider, AzureSearchClient,
    ChatCompletionModel, ChatOrchestrator, ChatRequest, ProjectDocument, RagContextService,
    RagError, Settings,
};
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::protocol::{ChatResponse, Citation, ErrorBody, HEALTH_MESSAGE, RagChatResponseBody};

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatOrchestrator<ChatRequest>>,
    pub rag: Arc<ChatOrchestrator<ProjectDocument>>,
    /// Model name sent with every request.
    pub model: String,
    pub top_k: usize,
}

impl AppState {
    pub fn new(
        chat: Arc<ChatOrchestrator<ChatRequest>>,
        rag: Arc<ChatOrchestrator<ProjectDocument>>,
    ) -> Self {
        Self { chat, rag, model: AvailableModel::Gpt41.model_name().to_string(), top_k: DEFAULT_TOP_K }
    }

    /// Build the Azure-backed clients from settings.
    pub fn from_settings(settings: &Settings, config: &ServerConfig) -> anyhow::Result<Self> {
        let chat_config = settings.chat_config().context("chat configuration")?;
        let model: Arc<dyn ChatCompletionModel> =
            Arc::new(AzureOpenAIChatClient::new(chat_config.clone())?);
        let embedder = Arc::new(AzureOpenAIEmbeddingProvider::new(
            settings.embedding_config().context("embedding configuration")?,
        )?);
        let index = Arc::new(AzureSearchClient::new(
            settings.search_config().context("search configuration")?,
        )?);

        let chat = ChatOrchestrator::<ChatRequest>::new(model.clone(), &chat_config)?;
        let rag = ChatOrchestrator::<ProjectDocument>::new(model, &chat_config)?
            .with_retrieval(RagContextService::<ProjectDocument>::new(embedder, index));

        Ok(Self {
            chat: Arc::new(chat),
            rag: Arc::new(rag),
            model: config.model.clone(),
            top_k: config.top_k,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub top_k: usize,
    pub model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7071,
            top_k: DEFAULT_TOP_K,
            model: AvailableModel::Gpt41.model_name().to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `RAGCHAT_HOST`, `RAGCHAT_PORT`, `RAGCHAT_TOP_K` and
    /// `RAGCHAT_MODEL`, keeping defaults for anything unset or unparsable.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            host: settings.get("RAGCHAT_HOST").map(str::to_string).unwrap_or(defaults.host),
            port: settings
                .get("RAGCHAT_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            top_k: settings
                .get("RAGCHAT_TOP_K")
                .and_then(|v| v.trim().parse().ok())
                .filter(|k| *k > 0)
                .unwrap_or(defaults.top_k),
            model: settings
                .get("RAGCHAT_MODEL")
                .map(|name| AvailableModel::from_name(name).model_name().to_string())
                .unwrap_or(defaults.model),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health).post(health))
        .route("/chat", post(chat))
        .route("/ragchat", post(rag_chat))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let state = AppState::from_settings(&settings, &config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for ragchat server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(model = %config.model, top_k = config.top_k, "ragchat listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Prompt cannot be empty.")]
    EmptyPrompt,
    #[error("An error occurred processing your request.")]
    Internal(#[from] RagError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EmptyPrompt => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Extract a non-blank prompt; a body that is not a JSON chat request counts
/// as an empty prompt.
fn require_prompt(
    endpoint: &'static str,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(endpoint, error = %rejection, "unreadable request body");
            return Err(ApiError::EmptyPrompt);
        }
    };
    match request.prompt() {
        Some(prompt) => Ok(prompt.to_string()),
        None => {
            warn!(endpoint, "Empty prompt received");
            Err(ApiError::EmptyPrompt)
        }
    }
}

async fn health() -> &'static str {
    info!("Health check endpoint processed a request.");
    HEALTH_MESSAGE
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let prompt = require_prompt("chat", body)?;
    info!(model = %state.model, "Requesting chat completion");

    let response = state.chat.chat_completion(&prompt, &state.model, None).await.map_err(|e| {
        error!(error = %e, "Error processing chat request");
        e
    })?;

    info!("chat completed successfully");
    Ok(Json(ChatResponse { response }))
}

async fn rag_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<RagChatResponseBody>, ApiError> {
    let prompt = require_prompt("ragchat", body)?;
    info!(model = %state.model, top_k = state.top_k, "Requesting RAG chat completion");

    let reply = state
        .rag
        .rag_chat_completion_with_citations(&prompt, &state.model, state.top_k)
        .await
        .map_err(|e| {
            error!(error = %e, "Error processing RAG chat request");
            e
        })?;

    info!(citations = reply.citations.len(), "ragchat completed successfully");
    Ok(Json(RagChatResponseBody {
        response: reply.answer,
        citations: reply.citations.into_iter().map(Citation::from).collect(),
    }))
}
