//! Embed a JSON file of projects and upload them to Azure AI Search.
//!
//! The binary is a thin wrapper around [`run`]; the pieces are public so the
//! file handling and configuration reporting can be tested without a network.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ragchat_rag::settings::{
    AZURE_SEARCH_API_KEY, AZURE_SEARCH_ENDPOINT, AZURE_SEARCH_INDEX, OPENAI_API_KEY,
    OPENAI_ENDPOINT,
};
use ragchat_rag::{
    AzureOpenAIEmbeddingProvider, AzureSearchClient, FailedEmbeddingPolicy, IngestReport,
    IngestionService, ProjectDocument, RagError, Settings,
};
use thiserror::Error;
use tracing::{info, warn};

/// Embed project documents and upload them to the search index.
#[derive(Parser, Debug)]
#[command(name = "ragchat-upload")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON array of project documents
    #[arg(long, default_value = "projects.json")]
    pub projects: PathBuf,

    /// Settings file with a `Values` object of configuration keys
    #[arg(long, default_value = "local.settings.json")]
    pub settings: PathBuf,

    /// Number of embedding requests in flight
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Leave documents whose embedding failed out of the upload
    #[arg(long)]
    pub skip_failed: bool,
}

impl Args {
    pub fn policy(&self) -> FailedEmbeddingPolicy {
        if self.skip_failed { FailedEmbeddingPolicy::Skip } else { FailedEmbeddingPolicy::UploadAnyway }
    }
}

/// The index rejected the batch. `report` still holds the embedding counts.
#[derive(Debug, Error)]
#[error("Error uploading to Azure AI Search: {source}")]
pub struct UploadFailed {
    pub report: IngestReport,
    #[source]
    pub source: RagError,
}

/// The line printed when a run finishes, successfully or not.
pub fn summary(report: &IngestReport) -> String {
    format!(
        "Process completed. Successfully processed: {}, Failed: {}",
        report.success, report.fail
    )
}

// The embedding deployment has a default, so only these are required.
const OPENAI_KEYS: &[&str] = &[OPENAI_ENDPOINT, OPENAI_API_KEY];
const SEARCH_KEYS: &[&str] = &[AZURE_SEARCH_ENDPOINT, AZURE_SEARCH_INDEX, AZURE_SEARCH_API_KEY];

/// The environment overlaid with `path`, if it exists and parses.
///
/// A missing or unreadable file is reported and the environment is used on
/// its own.
pub fn load_settings(base: Settings, path: &Path) -> Settings {
    if !path.exists() {
        println!("Warning: {} not found", path.display());
        return base;
    }
    let loaded = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|json| base.clone().with_local_settings(&json).map_err(anyhow::Error::from));
    match loaded {
        Ok(settings) => {
            println!("Environment variables loaded from {}", path.display());
            settings
        }
        Err(e) => {
            println!("Error loading settings: {e}");
            base
        }
    }
}

/// # Errors
///
/// Fails if the file is missing or is not a JSON array of projects.
pub fn load_projects(path: &Path) -> anyhow::Result<Vec<ProjectDocument>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("{} not found in the current directory", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("{} is not a list of projects", path.display()))
}

/// `KEY: Set` / `KEY: Missing` lines for every key of a group that has at
/// least one missing value. Empty when everything is configured.
pub fn missing_configuration(settings: &Settings) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, keys) in [("OpenAI", OPENAI_KEYS), ("Azure AI Search", SEARCH_KEYS)] {
        if keys.iter().all(|key| settings.is_set(key)) {
            continue;
        }
        lines.push(format!("Missing {name} configuration. Please check your environment variables."));
        for &key in keys {
            let state = if settings.is_set(key) { "Set" } else { "Missing" };
            lines.push(format!("{key}: {state}"));
        }
    }
    lines
}

/// Embed and upload `projects`.
///
/// Incomplete configuration is not an error: it is printed and every project
/// is reported as failed.
///
/// # Errors
///
/// Returns an error if a client cannot be built, or [`UploadFailed`] if the
/// upload is rejected.
pub async fn embed_and_upload(
    settings: &Settings,
    projects: Vec<ProjectDocument>,
    concurrency: usize,
    policy: FailedEmbeddingPolicy,
) -> anyhow::Result<IngestReport> {
    let missing = missing_configuration(settings);
    if !missing.is_empty() {
        for line in &missing {
            println!("{line}");
        }
        return Ok(IngestReport { success: 0, fail: projects.len(), uploaded: 0 });
    }

    let embedder = Arc::new(AzureOpenAIEmbeddingProvider::new(settings.embedding_config()?)?);
    let index = Arc::new(AzureSearchClient::new(settings.search_config()?)?);
    info!(index = index.index_name(), deployment = embedder.deployment(), "clients ready");

    let service = IngestionService::<ProjectDocument>::new(embedder, index)
        .with_concurrency(concurrency)
        .with_policy(policy);
    let embedded = service.embed_all(projects).await;
    let counts = embedded.report;
    service.upload(embedded).await.map_err(|source| UploadFailed { report: counts, source }.into())
}

/// Load settings and projects from the paths in `args`, then embed and
/// upload.
pub async fn run(args: &Args) -> anyhow::Result<IngestReport> {
    let settings = load_settings(Settings::from_env(), &args.settings);

    println!("Loading projects from {}...", args.projects.display());
    let projects = load_projects(&args.projects)?;
    println!("Loaded {} projects", projects.len());
    if projects.is_empty() {
        warn!("nothing to upload");
    }

    println!("Starting embedding and upload process...");
    embed_and_upload(&settings, projects, args.concurrency, args.policy()).await
}
