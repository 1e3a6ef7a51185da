//! Shared doubles for the integration tests: hand-written trait stubs and a
//! fake HTTP backend that records every request it receives.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::IntoResponse;
use ragchat_rag::{
    ChatCompletionModel, EmbeddingProvider, HybridSearchIndex, RagError, Result, SearchDocument,
};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Fake HTTP backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone)]
struct FakeState {
    status: StatusCode,
    body: Arc<String>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn capture(
    State(state): State<FakeState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.captured.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    (state.status, [(header::CONTENT_TYPE, "application/json")], state.body.as_ref().clone())
}

/// A running fake backend that answers every request with one canned reply.
pub struct FakeBackend {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    pub async fn spawn(status: u16, body: impl Into<String>) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: Arc::new(body.into()),
            captured: captured.clone(),
        };
        let app = Router::new().fallback(capture).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("listener addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend run");
        });

        Self { base_url: format!("http://{addr}"), captured, handle }
    }

    pub async fn json(status: u16, body: Value) -> Self {
        Self::spawn(status, body.to_string()).await
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Trait doubles
// ---------------------------------------------------------------------------

/// Returns a fixed vector, or fails for selected inputs.
pub struct StubEmbedder {
    vector: Vec<f32>,
    fail_on: Vec<String>,
    fail_all: bool,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail_on: Vec::new(),
            fail_all: false,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self { fail_all: true, ..Self::new(vec![]) }
    }

    pub fn failing_on(mut self, input: &str) -> Self {
        self.fail_on.push(input.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(text.to_string());
        if self.fail_all || self.fail_on.iter().any(|f| f == text) {
            return Err(RagError::BackendUnavailable {
                service: "stub".into(),
                message: "HTTP 500".into(),
            });
        }
        Ok(self.vector.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub query: String,
    pub vector: Vec<f32>,
    pub top_k: usize,
}

/// Returns preset documents and records every call.
pub struct StubIndex<D> {
    results: Vec<D>,
    fail_search: bool,
    fail_upload: bool,
    searches: Mutex<Vec<SearchCall>>,
    uploads: Mutex<Vec<Vec<D>>>,
}

impl<D: SearchDocument> StubIndex<D> {
    pub fn returning(results: Vec<D>) -> Self {
        Self {
            results,
            fail_search: false,
            fail_upload: false,
            searches: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_search() -> Self {
        Self { fail_search: true, ..Self::returning(Vec::new()) }
    }

    pub fn failing_upload() -> Self {
        Self { fail_upload: true, ..Self::returning(Vec::new()) }
    }

    pub fn searches(&self) -> Vec<SearchCall> {
        self.searches.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Vec<D>> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl<D: SearchDocument> HybridSearchIndex<D> for StubIndex<D> {
    async fn upload(&self, documents: &[D]) -> Result<usize> {
        self.uploads.lock().unwrap().push(documents.to_vec());
        if self.fail_upload {
            return Err(RagError::IndexingFailed("stub rejected batch".into()));
        }
        Ok(documents.len())
    }

    async fn hybrid_search(&self, query: &str, vector: &[f32], top_k: usize) -> Result<Vec<D>> {
        self.searches.lock().unwrap().push(SearchCall {
            query: query.to_string(),
            vector: vector.to_vec(),
            top_k,
        });
        if self.fail_search {
            return Err(RagError::SearchFailed { status: 503, body: "unavailable".into() });
        }
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    pub deployment: String,
    pub prompt: String,
}

/// Answers every prompt with a fixed reply and records what it was sent.
pub struct StubModel {
    answer: Option<String>,
    fail: bool,
    calls: Mutex<Vec<CompletionCall>>,
}

impl StubModel {
    pub fn answering(answer: &str) -> Self {
        Self { answer: Some(answer.to_string()), fail: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn silent() -> Self {
        Self { answer: None, fail: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { answer: None, fail: true, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletionModel for StubModel {
    async fn complete(&self, deployment: &str, prompt: &str) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(CompletionCall {
            deployment: deployment.to_string(),
            prompt: prompt.to_string(),
        });
        if self.fail {
            return Err(RagError::BackendUnavailable {
                service: "stub".into(),
                message: "model offline".into(),
            });
        }
        Ok(self.answer.clone())
    }
}

/// Deterministic embedding: hash the text, then spread it over `dim` values.
pub fn hash_embedding(text: &str, dim: usize) -> Vec<f32> {
    let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let mut emb: Vec<f32> = (0..dim).map(|i| ((hash.wrapping_add(i as u64)) as f32).sin()).collect();
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}
