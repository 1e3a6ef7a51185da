use ragchat_rag::ProjectDocument;
use serde::{Deserialize, Serialize};

pub const HEALTH_MESSAGE: &str = "The RAG Chat Bot API is running!";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagChatResponseBody {
    pub response: String,
    pub citations: Vec<Citation>,
}

/// The public projection of a cited project. Raw text and vectors stay
/// server-side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub date_range: Option<String>,
    pub metadata: Option<String>,
}

impl From<ProjectDocument> for Citation {
    fn from(doc: ProjectDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            tech_stack: doc.tech_stack,
            date_range: doc.date_range,
            metadata: doc.metadata,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_drops_text_and_vector() {
        let doc = ProjectDocument::new("p1", "secret raw text")
            .with_title("Portal")
            .with_vector(vec![0.1, 0.2]);
        let value = serde_json::to_value(Citation::from(doc)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "p1",
                "title": "Portal",
                "description": null,
                "tech_stack": null,
                "date_range": null,
                "metadata": null
            })
        );
    }
}
