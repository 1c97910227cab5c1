//! Retrieval: query embedding, ANN search, exact relevance gate
//!
//! The index's approximate distances are not trusted for the relevance
//! decision. Candidates coming back from the ANN search are re-scored with
//! exact cosine similarity against the stored embeddings, and only those at
//! or above the fixed threshold survive.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::store::ProductStore;

/// Minimum exact cosine similarity for a chunk to count as grounding context
pub const RELEVANCE_THRESHOLD: f32 = 0.35;

/// A chunk that survived the relevance gate, tagged with its product
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    /// `[PRODUCT] chunk text`, ready for prompt assembly
    pub text: String,
    /// Exact cosine similarity to the query
    pub similarity: f32,
}

/// Retrieves grounding passages for a query against one product's store
pub struct Retriever {
    store: Arc<ProductStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<ProductStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    /// Retrieve up to `top_k` passages for `message`, best match first
    ///
    /// Never fails: an unknown product, unusable artifacts, or an error in
    /// embedding or search all degrade to an empty list. Fewer than `top_k`
    /// passages come back when candidates fall below the relevance gate or
    /// point outside the chunk collection.
    pub fn retrieve(&self, message: &str, product: &str) -> Vec<RetrievedPassage> {
        let data = match self.store.get(product) {
            Some(data) => data,
            None => {
                warn!("Product '{}' not found in store", product);
                return Vec::new();
            }
        };
        let (index, chunks) = match (&data.index, &data.chunks) {
            (Some(index), Some(chunks)) => (index, chunks),
            _ => {
                warn!("Product '{}' has no usable index or chunks", product);
                return Vec::new();
            }
        };

        let query_embedding = match self.embedder.embed(message) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Query embedding failed: {}", e);
                return Vec::new();
            }
        };

        let positions = match index.search(&query_embedding, self.top_k) {
            Ok(positions) => positions,
            Err(e) => {
                warn!("Index search for '{}' failed: {}", product, e);
                return Vec::new();
            }
        };

        let label = product.to_uppercase();
        let mut passages = Vec::with_capacity(positions.len());
        for position in positions {
            // The index and chunk artifacts are written separately; a stale
            // pair can hand back positions the chunk file no longer has
            if position >= chunks.chunks.len() || position >= chunks.embeddings.len() {
                warn!(
                    "Product '{}': index position {} outside chunk collection ({} chunks)",
                    product,
                    position,
                    chunks.chunks.len()
                );
                continue;
            }
            let similarity = cosine_similarity(&query_embedding, &chunks.embeddings[position]);
            if similarity >= RELEVANCE_THRESHOLD {
                passages.push(RetrievedPassage {
                    text: format!("[{}] {}", label, chunks.chunks[position]),
                    similarity,
                });
            } else {
                debug!(
                    "Product '{}': position {} below relevance gate ({:.3} < {})",
                    product, position, similarity, RELEVANCE_THRESHOLD
                );
            }
        }

        if passages.is_empty() {
            debug!("No passage for '{}' cleared the relevance gate", product);
        }
        passages
    }
}
