//! Key/value settings source used by the binaries to build client configs.
//!
//! Values come from the process environment, optionally overlaid with the
//! `Values` object of a `local.settings.json` file. Nothing here mutates the
//! environment.

use std::collections::HashMap;
use std::ffi::OsString;

use serde::Deserialize;

use crate::config::{
    ChatConfig, DEFAULT_CHAT_DEPLOYMENT, DEFAULT_EMBEDDING_DEPLOYMENT, DEFAULT_OPENAI_API_VERSION,
    EmbeddingAuth, EmbeddingConfig, SearchConfig,
};
use crate::error::{RagError, Result};

pub const OPENAI_ENDPOINT: &str = "OPENAI_ENDPOINT";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_API_VERSION: &str = "OPENAI_API_VERSION";
pub const OPENAI_EMBEDDING_DEPLOYMENT: &str = "OPENAI_EMBEDDING_DEPLOYMENT";
pub const OPENAI_EMBEDDING_AUTH: &str = "OPENAI_EMBEDDING_AUTH";
pub const OPENAI_EMBEDDING_DIMENSIONS: &str = "OPENAI_EMBEDDING_DIMENSIONS";
pub const OPENAI_CHAT_DEPLOYMENT: &str = "OPENAI_CHAT_DEPLOYMENT";
pub const OPENAI_CHAT_DEPLOYMENTS: &str = "OPENAI_CHAT_DEPLOYMENTS";
pub const SK_ENDPOINT: &str = "SemanticKernel:Endpoint";
pub const SK_API_KEY: &str = "SemanticKernel:ApiKey";
pub const SK_CHAT_DEPLOYMENT: &str = "SemanticKernel:ChatDeployment";
pub const AZURE_SEARCH_ENDPOINT: &str = "AZURE_SEARCH_ENDPOINT";
pub const AZURE_SEARCH_INDEX: &str = "AZURE_SEARCH_INDEX";
pub const AZURE_SEARCH_API_KEY: &str = "AZURE_SEARCH_API_KEY";

/// Shape of a `local.settings.json` file.
#[derive(Debug, Default, Deserialize)]
struct LocalSettings {
    #[serde(rename = "Values", default)]
    values: HashMap<String, String>,
}

/// An immutable snapshot of configuration values.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Snapshot the current process environment. Variables whose name or
    /// value is not valid UTF-8 are left out.
    pub fn from_env() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    fn from_os_pairs(pairs: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let values = pairs
            .into_iter()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { values }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self { values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Overlay the `Values` of a `local.settings.json` document. File values
    /// win over existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if the document is not valid JSON
    /// of the expected shape.
    pub fn with_local_settings(mut self, json: &str) -> Result<Self> {
        let parsed: LocalSettings = serde_json::from_str(json)
            .map_err(|e| RagError::invalid(format!("invalid local settings: {e}")))?;
        self.values.extend(parsed.values);
        Ok(self)
    }

    /// Look up a non-blank value. Keys containing `:` also match their
    /// environment form with `__` as the separator.
    pub fn get(&self, key: &str) -> Option<&str> {
        let found = self.values.get(key).or_else(|| {
            if key.contains(':') { self.values.get(&key.replace(':', "__")) } else { None }
        });
        found.map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Build and validate the embedding client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] when a required value is missing
    /// or an optional value cannot be parsed.
    pub fn embedding_config(&self) -> Result<EmbeddingConfig> {
        let mut config = EmbeddingConfig::new(
            self.get_or(OPENAI_ENDPOINT, ""),
            self.get_or(OPENAI_API_KEY, ""),
        )
        .with_deployment(self.get_or(OPENAI_EMBEDDING_DEPLOYMENT, DEFAULT_EMBEDDING_DEPLOYMENT))
        .with_api_version(self.get_or(OPENAI_API_VERSION, DEFAULT_OPENAI_API_VERSION));

        if let Some(auth) = self.get(OPENAI_EMBEDDING_AUTH) {
            config = config.with_auth(parse_auth(auth)?);
        }
        if let Some(dims) = self.get(OPENAI_EMBEDDING_DIMENSIONS) {
            let dims = dims.trim().parse::<usize>().map_err(|e| {
                RagError::invalid(format!("{OPENAI_EMBEDDING_DIMENSIONS} is not a number: {e}"))
            })?;
            config = config.with_dimensions(dims);
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] when a required value is missing.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let config = SearchConfig::new(
            self.get_or(AZURE_SEARCH_ENDPOINT, ""),
            self.get_or(AZURE_SEARCH_INDEX, ""),
            self.get_or(AZURE_SEARCH_API_KEY, ""),
        );
        config.validate()?;
        Ok(config)
    }

    /// Chat settings prefer the `SemanticKernel:*` keys and fall back to the
    /// `OPENAI_*` ones.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] when the endpoint or key is
    /// missing, or `OPENAI_CHAT_DEPLOYMENTS` is not a `model=deployment` list.
    pub fn chat_config(&self) -> Result<ChatConfig> {
        let endpoint = self.get(SK_ENDPOINT).or_else(|| self.get(OPENAI_ENDPOINT)).unwrap_or("");
        let api_key = self.get(SK_API_KEY).or_else(|| self.get(OPENAI_API_KEY)).unwrap_or("");
        let deployment = self
            .get(SK_CHAT_DEPLOYMENT)
            .or_else(|| self.get(OPENAI_CHAT_DEPLOYMENT))
            .unwrap_or(DEFAULT_CHAT_DEPLOYMENT);

        let mut config = ChatConfig::new(endpoint, api_key)
            .with_deployment(deployment)
            .with_api_version(self.get_or(OPENAI_API_VERSION, DEFAULT_OPENAI_API_VERSION));

        if let Some(list) = self.get(OPENAI_CHAT_DEPLOYMENTS) {
            for (model, deployment) in parse_deployment_list(list)? {
                config = config.with_model_deployment(model, deployment);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_auth(value: &str) -> Result<EmbeddingAuth> {
    match value.trim().to_ascii_lowercase().as_str() {
        "bearer" => Ok(EmbeddingAuth::Bearer),
        "api-key" | "api_key" | "apikey" => Ok(EmbeddingAuth::ApiKey),
        other => Err(RagError::invalid(format!("unknown {OPENAI_EMBEDDING_AUTH} '{other}'"))),
    }
}

fn parse_deployment_list(list: &str) -> Result<Vec<(String, String)>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (model, deployment) = entry.split_once('=').ok_or_else(|| {
                RagError::invalid(format!(
                    "{OPENAI_CHAT_DEPLOYMENTS} entry '{entry}' is not model=deployment"
                ))
            })?;
            Ok((model.trim().to_string(), deployment.trim().to_string()))
        })
        .collect()
}
