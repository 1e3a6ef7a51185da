//! Minimal prompt templates with `{{$name}}` placeholders.

use std::collections::HashMap;

use crate::error::{RagError, Result};

/// The chat prompt: retrieved context, then the user turn.
pub const CHAT_WITH_CONTEXT: &str = "{{$context}}\nUser: {{$user_input}}\nAssistant:";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Variable(String),
}

/// A template parsed once and rendered many times.
///
/// Substituted values are never re-scanned, so user input containing
/// `{{$context}}` is emitted literally.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] for an unterminated or empty
    /// placeholder.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find("{{$") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 3..];
            let end = after
                .find("}}")
                .ok_or_else(|| RagError::invalid("unterminated template placeholder"))?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(RagError::invalid("empty template placeholder"));
            }
            segments.push(Segment::Variable(name.to_string()));
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(Self { segments })
    }

    /// Fill placeholders; missing variables render as empty strings.
    pub fn render(&self, variables: &HashMap<&str, &str>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    out.push_str(variables.get(name.as_str()).copied().unwrap_or_default())
                }
            }
        }
        out
    }
}
