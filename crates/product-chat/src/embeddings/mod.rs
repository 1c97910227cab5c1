//! Query embedding
//!
//! Every product store was built with all-MiniLM-L6-v2 embeddings, so the
//! query side is pinned to the same model and width. Swapping either would
//! silently break every index on disk.

pub mod onnx;

pub use onnx::OnnxEmbedder;

use crate::error::Result;

/// Sentence-transformers model every store artifact was embedded with
pub const EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
/// Output width of the embedding model
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Anything that can turn text into a query embedding
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding width this provider produces
    fn dimensions(&self) -> usize;
}

/// Exact cosine similarity between two vectors
///
/// The small epsilon in the denominator keeps zero vectors from dividing by
/// zero; they score 0.0 instead.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + 1e-12)
}
