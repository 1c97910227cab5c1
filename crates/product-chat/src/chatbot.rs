//! Chatbot entry point
//!
//! Composes retrieval and response generation over process-scoped immutable
//! context (product store, embedder, completion client). Everything is built
//! once at startup; per-query calls share it read-only and never fail.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ChatbotConfig;
use crate::embeddings::{EmbeddingProvider, OnnxEmbedder};
use crate::error::Result;
use crate::generation::{CompletionProvider, OpenRouterClient, Responder};
use crate::retrieval::Retriever;
use crate::store::ProductStore;

/// Result of one answer cycle, for surfaces that report retrieval stats
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Final answer text
    pub answer: String,
    /// Passages that grounded it (zero on the welcome path)
    pub passages_used: usize,
}

/// The chatbot service: retrieval plus grounded response generation
#[derive(Clone)]
pub struct Chatbot {
    store: Arc<ProductStore>,
    retriever: Arc<Retriever>,
    responder: Arc<Responder>,
    default_product: String,
}

impl Chatbot {
    /// Build the full chatbot from configuration
    ///
    /// Loads the product store, initializes the ONNX embedder (downloading
    /// model files on first run), and wires up the OpenRouter client. Only
    /// the data root being unreadable or the embedder failing to come up
    /// are fatal here.
    pub async fn new(config: &ChatbotConfig) -> Result<Self> {
        info!(
            "Initializing chatbot (data root: {})",
            config.store.data_root.display()
        );

        let store = Arc::new(ProductStore::load(&config.store.data_root)?);
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OnnxEmbedder::new(&config.embeddings).await?);
        let completion: Arc<dyn CompletionProvider> =
            Arc::new(OpenRouterClient::new(&config.completion));

        Ok(Self::from_parts(
            store,
            embedder,
            completion,
            &config.store.default_product,
            config.retrieval.top_k,
        ))
    }

    /// Assemble a chatbot from already-built components
    pub(crate) fn from_parts(
        store: Arc<ProductStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
        default_product: impl Into<String>,
        top_k: usize,
    ) -> Self {
        // A product indexed at a different width than the embedder produces
        // is loadable but will never retrieve anything; say so up front
        for name in store.product_names() {
            if let Some(index) = store.get(&name).and_then(|data| data.index.as_ref()) {
                if index.dimensions() != embedder.dimensions() {
                    warn!(
                        "Product '{}': index width {} does not match embedder width {}; queries will retrieve nothing",
                        name,
                        index.dimensions(),
                        embedder.dimensions()
                    );
                }
            }
        }

        let retriever = Arc::new(Retriever::new(store.clone(), embedder, top_k));
        let responder = Arc::new(Responder::new(completion));
        Self {
            store,
            retriever,
            responder,
            default_product: default_product.into(),
        }
    }

    /// Answer a message about a product, reporting retrieval stats
    pub async fn chat(&self, message: &str, product: &str) -> ChatOutcome {
        let retriever = self.retriever.clone();
        let query = message.to_string();
        let product_name = product.to_string();

        // Embedding and search are CPU-bound; keep them off the async runtime
        let passages = match tokio::task::spawn_blocking(move || {
            retriever.retrieve(&query, &product_name)
        })
        .await
        {
            Ok(passages) => passages,
            Err(e) => {
                warn!("Retrieval task failed: {}", e);
                Vec::new()
            }
        };

        let answer = self.responder.respond(message, &passages, product).await;
        ChatOutcome {
            answer,
            passages_used: passages.len(),
        }
    }

    /// Answer a message about a product
    ///
    /// Never fails: every degradation resolves to a fixed string.
    pub async fn answer(&self, message: &str, product: &str) -> String {
        self.chat(message, product).await.answer
    }

    /// Answer a message about the default product
    pub async fn answer_default(&self, message: &str) -> String {
        let product = self.default_product.clone();
        self.answer(message, &product).await
    }

    /// Product the chatbot answers for when none is named
    pub fn default_product(&self) -> &str {
        &self.default_product
    }

    /// The loaded product store
    pub fn store(&self) -> &ProductStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::testing::StubEmbedder;
    use crate::generation::testing::StubCompletion;
    use crate::generation::{APOLOGY_MESSAGE, INTERRUPTION_MESSAGE, WELCOME_MESSAGE};
    use crate::store::format::{chunk_path, index_path, ChunkFile, IndexFile};
    use std::path::Path;
    use tempfile::TempDir;

    const QUERY: &str = "what payment methods do you accept";

    fn write_acme_store(root: &Path) {
        let dir = root.join("Acme");
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        IndexFile {
            dimensions: 3,
            vectors: embeddings.clone(),
        }
        .write_to(&index_path(&dir))
        .unwrap();
        ChunkFile {
            chunks: vec![
                "We accept credit card and bank transfer.".to_string(),
                "Office hours are 9-5.".to_string(),
            ],
            embeddings,
        }
        .write_to(&chunk_path(&dir))
        .unwrap();
    }

    fn chatbot_with(root: &Path, completion: Arc<StubCompletion>) -> Chatbot {
        let store = Arc::new(ProductStore::load(root).unwrap());
        let embedder = Arc::new(StubEmbedder::new(3).with_response(QUERY, vec![1.0, 0.0, 0.0]));
        Chatbot::from_parts(store, embedder, completion, "Acme", 3)
    }

    #[tokio::test]
    async fn test_unknown_product_gets_welcome() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::ok("unused"));
        let chatbot = chatbot_with(tmp.path(), stub.clone());

        let answer = chatbot.answer(QUERY, "Nonexistent").await;
        assert_eq!(answer, WELCOME_MESSAGE);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_grounded_answer_end_to_end() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::ok("We accept credit card and bank transfer."));
        let chatbot = chatbot_with(tmp.path(), stub.clone());

        let outcome = chatbot.chat(QUERY, "Acme").await;
        assert_eq!(outcome.answer, "We accept credit card and bank transfer.");
        assert_eq!(outcome.passages_used, 1);

        // Only the relevant chunk reaches the prompt's context
        let prompts = stub.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[ACME] We accept credit card and bank transfer."));
        assert!(!prompts[0].contains("Office hours"));
    }

    #[tokio::test]
    async fn test_default_product_used_when_unnamed() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::ok("Grounded answer."));
        let chatbot = chatbot_with(tmp.path(), stub);

        assert_eq!(chatbot.default_product(), "Acme");
        let answer = chatbot.answer_default(QUERY).await;
        assert_eq!(answer, "Grounded answer.");
    }

    #[tokio::test]
    async fn test_upstream_status_yields_apology() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::status(500, "boom"));
        let chatbot = chatbot_with(tmp.path(), stub);

        let answer = chatbot.answer(QUERY, "Acme").await;
        assert_eq!(answer, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_interruption() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::transport("dns failure"));
        let chatbot = chatbot_with(tmp.path(), stub);

        let answer = chatbot.answer(QUERY, "Acme").await;
        assert_eq!(answer, INTERRUPTION_MESSAGE);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_idempotent() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let stub = Arc::new(StubCompletion::ok("Stable answer."));
        let chatbot = chatbot_with(tmp.path(), stub);

        let first = chatbot.answer(QUERY, "Acme").await;
        let second = chatbot.answer(QUERY, "Acme").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_index_width_mismatch_falls_back_to_welcome() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let store = Arc::new(ProductStore::load(tmp.path()).unwrap());
        let stub = Arc::new(StubCompletion::ok("unused"));
        // Store is indexed 3 wide, this embedder answers 2 wide
        let embedder = Arc::new(StubEmbedder::new(2).with_response(QUERY, vec![1.0, 0.0]));
        let chatbot = Chatbot::from_parts(store, embedder, stub.clone(), "Acme", 3);

        let answer = chatbot.answer(QUERY, "Acme").await;
        assert_eq!(answer, WELCOME_MESSAGE);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedder_failure_degrades_to_welcome() {
        let tmp = TempDir::new().unwrap();
        write_acme_store(tmp.path());
        let store = Arc::new(ProductStore::load(tmp.path()).unwrap());
        let stub = Arc::new(StubCompletion::ok("unused"));
        let chatbot = Chatbot::from_parts(
            store,
            Arc::new(StubEmbedder::failing(3)),
            stub.clone(),
            "Acme",
            3,
        );

        let answer = chatbot.answer(QUERY, "Acme").await;
        assert_eq!(answer, WELCOME_MESSAGE);
        assert_eq!(stub.call_count(), 0);
    }
}
