//! In-memory hybrid index for development and tests.
//!
//! [`InMemoryHybridIndex`] keeps documents in a `HashMap` behind a
//! `tokio::sync::RwLock` and answers hybrid queries by fusing a cosine
//! similarity ranking with a term-overlap ranking using Reciprocal Rank
//! Fusion, the same family of fusion the hosted search service applies.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::SearchDocument;
use crate::error::{RagError, Result};
use crate::search::HybridSearchIndex;

/// RRF damping constant.
const RRF_K: f32 = 60.0;

/// An in-memory [`HybridSearchIndex`].
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_rag::{HybridSearchIndex, InMemoryHybridIndex, ProjectDocument};
///
/// let index = InMemoryHybridIndex::<ProjectDocument>::new();
/// index.upload(&docs).await?;
/// ```
#[derive(Debug)]
pub struct InMemoryHybridIndex<D> {
    documents: RwLock<HashMap<String, D>>,
}

impl<D> Default for InMemoryHybridIndex<D> {
    fn default() -> Self {
        Self { documents: RwLock::new(HashMap::new()) }
    }
}

impl<D: SearchDocument> InMemoryHybridIndex<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn get(&self, key: &str) -> Option<D> {
        self.documents.read().await.get(key).cloned()
    }
}

/// Cosine similarity, or 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn by_score_then_key(a: &(&str, f32), b: &(&str, f32)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(b.0))
}

/// Fuse ranked key lists: score = Σ 1 / (k + rank + 1).
fn reciprocal_rank_fusion<'a>(lists: &[Vec<(&'a str, f32)>]) -> Vec<(&'a str, f32)> {
    let mut scores: HashMap<&'a str, f32> = HashMap::new();
    for list in lists {
        for (rank, (key, _)) in list.iter().enumerate() {
            *scores.entry(*key).or_default() += 1.0 / (RRF_K + rank as f32 + 1.0);
        }
    }
    let mut fused: Vec<_> = scores.into_iter().collect();
    fused.sort_by(by_score_then_key);
    fused
}

#[async_trait]
impl<D: SearchDocument> HybridSearchIndex<D> for InMemoryHybridIndex<D> {
    async fn upload(&self, documents: &[D]) -> Result<usize> {
        let mut store = self.documents.write().await;
        let mut count = 0;
        for document in documents {
            if let Some(key) = document.document_key() {
                store.insert(key.to_string(), document.clone());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn hybrid_search(&self, query: &str, vector: &[f32], top_k: usize) -> Result<Vec<D>> {
        if top_k == 0 {
            return Err(RagError::invalid("top_k must be greater than zero"));
        }

        let store = self.documents.read().await;

        let mut by_vector: Vec<(&str, f32)> = store
            .iter()
            .filter_map(|(key, doc)| {
                let stored = doc.content_vector()?;
                (stored.len() == vector.len())
                    .then(|| (key.as_str(), cosine_similarity(stored, vector)))
            })
            .collect();
        by_vector.sort_by(by_score_then_key);
        // The vector query only contributes its k nearest neighbours.
        by_vector.truncate(top_k);

        let query_terms = terms(query);
        let mut by_text: Vec<(&str, f32)> = store
            .iter()
            .filter_map(|(key, doc)| {
                let overlap = terms(&doc.context_text()).intersection(&query_terms).count();
                (overlap > 0).then_some((key.as_str(), overlap as f32))
            })
            .collect();
        by_text.sort_by(by_score_then_key);

        let fused = reciprocal_rank_fusion(&[by_vector, by_text]);
        Ok(fused.into_iter().take(top_k).filter_map(|(key, _)| store.get(key).cloned()).collect())
    }
}
