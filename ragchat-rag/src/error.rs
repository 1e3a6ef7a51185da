//! Error types for the `ragchat-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and chat operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An input or configuration value was rejected before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding or chat backend could not be reached or returned a
    /// non-success status.
    #[error("Backend unavailable ({service}): {message}")]
    BackendUnavailable {
        /// The backend that failed.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// The search backend answered a query with a non-success status.
    #[error("Search failed with status {status}: {body}")]
    SearchFailed {
        /// HTTP status code returned by the search backend.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The search backend rejected an upload batch.
    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    /// A backend response could not be parsed into the expected shape.
    #[error("Malformed response ({service}): {message}")]
    MalformedResponse {
        /// The backend that produced the response.
        service: String,
        /// What was wrong with it.
        message: String,
    },
}

impl RagError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn unavailable(service: &str, message: impl Into<String>) -> Self {
        Self::BackendUnavailable { service: service.to_string(), message: message.into() }
    }

    pub(crate) fn malformed(service: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse { service: service.to_string(), message: message.into() }
    }

    /// Whether this error was raised by input or configuration validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Reject empty or whitespace-only text.
pub(crate) fn require_text(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RagError::invalid(format!("{what} cannot be empty.")));
    }
    Ok(())
}
