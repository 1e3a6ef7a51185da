//! Document shapes and the capabilities the pipeline needs from them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A document type that can be returned by a hybrid search and turned into
/// context for the chat model.
///
/// The default [`context_text`](SearchDocument::context_text) renders the
/// document as JSON; shapes with a natural text field should override it.
pub trait SearchDocument: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Text contributed to the assembled context for this document.
    fn context_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Index key. Documents without one cannot be uploaded.
    fn document_key(&self) -> Option<&str> {
        None
    }

    /// The stored embedding, if any. An empty vector counts as none.
    fn content_vector(&self) -> Option<&[f32]> {
        None
    }
}

/// A [`SearchDocument`] that can be embedded before upload.
pub trait EmbeddableDocument: SearchDocument {
    /// Text sent to the embedding model.
    fn embedding_input(&self) -> &str;

    fn set_content_vector(&mut self, vector: Vec<f32>);
}

/// A project entry in the portfolio index.
///
/// Every field is optional on the wire because the search service returns
/// `null` for anything unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectDocument {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    /// Free-form date range, e.g. `"2020-2021"`.
    pub date_range: Option<String>,
    pub metadata: Option<String>,
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_vector: Option<Vec<f32>>,
}

impl ProjectDocument {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self { id: Some(id.into()), raw_text: Some(raw_text.into()), ..Self::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.content_vector = Some(vector);
        self
    }
}

impl SearchDocument for ProjectDocument {
    /// The raw text on one line: line breaks become single spaces so each
    /// project stays one line of the assembled context.
    fn context_text(&self) -> String {
        let text = self.raw_text.as_deref().unwrap_or_default();
        text.split(['\r', '\n']).filter(|line| !line.is_empty()).collect::<Vec<_>>().join(" ")
    }

    fn document_key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn content_vector(&self) -> Option<&[f32]> {
        self.content_vector.as_deref().filter(|v| !v.is_empty())
    }
}

impl EmbeddableDocument for ProjectDocument {
    fn embedding_input(&self) -> &str {
        self.raw_text.as_deref().unwrap_or("")
    }

    fn set_content_vector(&mut self, vector: Vec<f32>) {
        self.content_vector = Some(vector);
    }
}

/// Request body of the chat endpoints.
///
/// Also serves as the document type of a chat orchestrator that has no
/// retrieval index behind it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: Some(prompt.into()) }
    }

    /// The prompt, if present and not blank.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }
}

impl SearchDocument for ChatRequest {}

/// Context assembled from retrieved documents.
///
/// `citations[i]` produced the `i`-th line of `context` as long as each
/// document's context text is a single line; the order is the order the
/// search backend returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RagContextResult<D> {
    pub context: String,
    pub citations: Vec<D>,
}

impl<D: SearchDocument> RagContextResult<D> {
    /// Join each document's context text with `\n`, keeping the order.
    pub fn from_documents(documents: Vec<D>) -> Self {
        let context =
            documents.iter().map(SearchDocument::context_text).collect::<Vec<_>>().join("\n");
        Self { context, citations: documents }
    }
}

impl<D> Default for RagContextResult<D> {
    fn default() -> Self {
        Self { context: String::new(), citations: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_context_is_raw_text() {
        let doc = ProjectDocument::new("p1", "Uses ASP.NET Core.");
        assert_eq!(doc.context_text(), "Uses ASP.NET Core.");
        assert_eq!(ProjectDocument::default().context_text(), "");
    }

    #[test]
    fn project_context_flattens_line_breaks() {
        let doc = ProjectDocument::new("p1", "Uses ASP.NET Core.\r\nDeployed on Azure.\n\nHosted in EU.\n");
        assert_eq!(doc.context_text(), "Uses ASP.NET Core. Deployed on Azure. Hosted in EU.");
    }

    #[test]
    fn chat_request_falls_back_to_json() {
        let request = ChatRequest::new("hi");
        assert_eq!(request.context_text(), r#"{"prompt":"hi"}"#);
        assert_eq!(request.document_key(), None);
    }

    #[test]
    fn blank_prompt_is_absent() {
        assert_eq!(ChatRequest::new("   ").prompt(), None);
        assert_eq!(ChatRequest::default().prompt(), None);
        assert_eq!(ChatRequest::new("x").prompt(), Some("x"));
    }

    #[test]
    fn empty_vector_is_not_retrievable() {
        let doc = ProjectDocument::new("p1", "t").with_vector(Vec::new());
        assert!(doc.content_vector().is_none());
        let doc = ProjectDocument::new("p1", "t").with_vector(vec![1.0]);
        assert_eq!(doc.content_vector(), Some(&[1.0][..]));
    }

    #[test]
    fn deserializes_search_hit_with_nulls_and_extras() {
        let hit = serde_json::json!({
            "@search.score": 0.03,
            "id": "p1",
            "title": null,
            "tech_stack": ["Rust"],
            "raw_text": "Built with Node.js."
        });
        let doc: ProjectDocument = serde_json::from_value(hit).unwrap();
        assert_eq!(doc.id.as_deref(), Some("p1"));
        assert_eq!(doc.title, None);
        assert_eq!(doc.tech_stack, Some(vec!["Rust".to_string()]));
        assert_eq!(doc.content_vector, None);
    }

    #[test]
    fn context_lines_follow_citation_order() {
        let result = RagContextResult::from_documents(vec![
            ProjectDocument::new("a", "first"),
            ProjectDocument::new("b", "second"),
        ]);
        assert_eq!(result.context, "first\nsecond");
        assert_eq!(result.citations[1].id.as_deref(), Some("b"));
    }
}
