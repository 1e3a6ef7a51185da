use std::fs;
use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use ragchat_rag::{FailedEmbeddingPolicy, IngestReport, ProjectDocument, RagError, Settings};
use ragchat_upload::{UploadFailed, embed_and_upload, load_projects, load_settings};
use serde_json::{Value, json};

const PROJECTS: &str = r#"[
    {"id": "p1", "title": "Portal", "description": null, "tech_stack": ["C#", "ASP.NET Core"],
     "date_range": "2019-2020", "metadata": null, "raw_text": "Uses ASP.NET Core."},
    {"id": "p2", "title": "Gateway", "description": "API gateway", "tech_stack": ["Node.js"],
     "date_range": "2021", "metadata": "internal", "raw_text": "Built with Node.js."}
]"#;

#[test]
fn loads_projects_from_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(&path, PROJECTS).unwrap();

    let projects = load_projects(&path).unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].id.as_deref(), Some("p2"));
    assert_eq!(projects[1].tech_stack, Some(vec!["Node.js".to_string()]));
    assert!(projects[0].content_vector.is_none());
}

#[test]
fn missing_projects_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_projects(&dir.path().join("projects.json")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn settings_file_overlays_base_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.settings.json");
    fs::write(
        &path,
        r#"{"IsEncrypted": false, "Values": {"AZURE_SEARCH_INDEX": "projects", "OPENAI_API_KEY": "from-file"}}"#,
    )
    .unwrap();

    let base = Settings::from_pairs([("OPENAI_API_KEY", "from-env"), ("OPENAI_ENDPOINT", "https://e")]);
    let settings = load_settings(base, &path);
    assert_eq!(settings.get("AZURE_SEARCH_INDEX"), Some("projects"));
    assert_eq!(settings.get("OPENAI_API_KEY"), Some("from-file"));
    assert_eq!(settings.get("OPENAI_ENDPOINT"), Some("https://e"));
}

#[test]
fn missing_or_broken_settings_file_keeps_base() {
    let dir = tempfile::tempdir().unwrap();
    let base = Settings::from_pairs([("OPENAI_ENDPOINT", "https://e")]);

    let settings = load_settings(base.clone(), &dir.path().join("absent.json"));
    assert_eq!(settings.get("OPENAI_ENDPOINT"), Some("https://e"));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    let settings = load_settings(base, &broken);
    assert_eq!(settings.get("OPENAI_ENDPOINT"), Some("https://e"));
}

#[tokio::test]
async fn incomplete_configuration_fails_every_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(&path, PROJECTS).unwrap();
    let projects = load_projects(&path).unwrap();

    let settings = Settings::from_pairs([("OPENAI_ENDPOINT", "https://e")]);
    let report =
        embed_and_upload(&settings, projects, 1, FailedEmbeddingPolicy::UploadAnyway).await.unwrap();
    assert_eq!(report, IngestReport { success: 0, fail: 2, uploaded: 0 });
}

const FAILING_TEXT: &str = "Legacy COBOL batch jobs.";

#[derive(Clone)]
struct Azure {
    index_status: StatusCode,
    uploads: Arc<Mutex<Vec<Value>>>,
}

async fn embeddings(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["input"] == FAILING_TEXT {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"message": "boom"}})));
    }
    (StatusCode::OK, Json(json!({"data": [{"embedding": [0.1, 0.2], "index": 0}]})))
}

async fn index_docs(State(azure): State<Azure>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    azure.uploads.lock().unwrap().push(body.clone());
    let items: Vec<Value> = body["value"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|doc| json!({"key": doc["id"], "status": azure.index_status.is_success(), "statusCode": 201}))
        .collect();
    (azure.index_status, Json(json!({"value": items})))
}

/// One local server standing in for both Azure OpenAI and Azure AI Search.
async fn spawn_azure(index_status: StatusCode) -> (Settings, Azure, tokio::task::JoinHandle<()>) {
    let azure = Azure { index_status, uploads: Arc::new(Mutex::new(Vec::new())) };
    let app = Router::new()
        .route("/openai/deployments/{deployment}/embeddings", post(embeddings))
        .route("/indexes/{index}/docs/index", post(index_docs))
        .with_state(azure.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake azure");
    let base = format!("http://{}", listener.local_addr().expect("listener addr"));
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake azure run");
    });

    let settings = Settings::from_pairs([
        ("OPENAI_ENDPOINT", base.as_str()),
        ("OPENAI_API_KEY", "openai-key"),
        ("AZURE_SEARCH_ENDPOINT", base.as_str()),
        ("AZURE_SEARCH_INDEX", "projects"),
        ("AZURE_SEARCH_API_KEY", "search-key"),
    ]);
    (settings, azure, handle)
}

fn three_projects() -> Vec<ProjectDocument> {
    vec![
        ProjectDocument::new("p1", "Uses ASP.NET Core."),
        ProjectDocument::new("p2", FAILING_TEXT),
        ProjectDocument::new("p3", "Built with Node.js."),
    ]
}

#[tokio::test]
async fn uploads_every_project_when_one_embedding_fails() {
    let (settings, azure, handle) = spawn_azure(StatusCode::OK).await;

    let report = embed_and_upload(&settings, three_projects(), 1, FailedEmbeddingPolicy::UploadAnyway)
        .await
        .unwrap();
    assert_eq!(report, IngestReport { success: 2, fail: 1, uploaded: 3 });

    let uploads = azure.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let docs = uploads[0]["value"].as_array().unwrap();
    let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert!(docs.iter().all(|d| d["@search.action"] == "upload"));
    assert_eq!(docs[0]["content_vector"], json!([0.1, 0.2]));
    assert!(docs[1].get("content_vector").is_none());

    handle.abort();
}

#[tokio::test]
async fn rejected_upload_keeps_embedding_counts() {
    let (settings, _azure, handle) = spawn_azure(StatusCode::FORBIDDEN).await;

    let err = embed_and_upload(&settings, three_projects(), 1, FailedEmbeddingPolicy::UploadAnyway)
        .await
        .unwrap_err();
    let failed = err.downcast_ref::<UploadFailed>().expect("upload failure");
    assert_eq!(failed.report, IngestReport { success: 2, fail: 1, uploaded: 0 });
    assert!(matches!(failed.source, RagError::IndexingFailed(_)));

    handle.abort();
}
