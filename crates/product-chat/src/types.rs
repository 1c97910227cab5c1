//! HTTP wire types for the chat API

use serde::{Deserialize, Serialize};

/// Chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user message to answer
    pub message: String,

    /// Product to answer for; the configured default applies when omitted
    #[serde(default)]
    pub product: Option<String>,
}

/// Chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Final answer text (grounded answer or a fixed degradation string)
    pub answer: String,
    /// Product the answer was generated for
    pub product: String,
    /// Number of passages that survived the relevance gate
    pub passages_used: usize,
    /// Wall-clock time spent answering
    pub processing_time_ms: u64,
}

/// Product listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    /// One entry per product, in sorted name order
    pub products: Vec<ProductInfo>,
    /// Number of products listed
    pub count: usize,
}

/// Per-product detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Product name as found on disk
    pub name: String,
    /// Whether both retrieval artifacts loaded
    pub usable: bool,
    /// Number of chunks available for retrieval
    pub chunks: usize,
}
