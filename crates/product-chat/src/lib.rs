//! product-chat: Retrieval-grounded product support chatbot
//!
//! This crate serves chat answers grounded in per-product knowledge bases. Each
//! product ships a prebuilt HNSW index plus its chunk texts; incoming questions
//! are embedded locally with ONNX, matched against the product's index, and the
//! retrieved passages are handed to a hosted completion model for the final
//! answer.

pub mod chatbot;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod retrieval;
pub mod server;
pub mod store;
pub mod types;

pub use chatbot::{ChatOutcome, Chatbot};
pub use config::ChatbotConfig;
pub use error::{Error, Result};
pub use retrieval::RetrievedPassage;
pub use types::{ChatRequest, ChatResponse};
