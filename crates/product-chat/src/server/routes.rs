//! API routes for the chat server

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, ProductInfo, ProductsResponse};

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/products", get(list_products))
        .route("/products/:name", get(get_product))
        .route("/info", get(info))
}

/// POST /api/chat - answer a message about a product
///
/// Always 200 for well-formed JSON: every degradation inside the chatbot
/// resolves to a fixed answer string.
async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    let start = Instant::now();

    let product = request
        .product
        .unwrap_or_else(|| state.chatbot().default_product().to_string());

    tracing::info!("Chat: product='{}', message=\"{}\"", product, request.message);

    let outcome = state.chatbot().chat(&request.message, &product).await;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Chat completed in {}ms, {} passages used",
        processing_time_ms,
        outcome.passages_used
    );

    Json(ChatResponse {
        answer: outcome.answer,
        product,
        passages_used: outcome.passages_used,
        processing_time_ms,
    })
}

/// GET /api/products - list all products discovered at startup
async fn list_products(State(state): State<AppState>) -> Json<ProductsResponse> {
    let store = state.chatbot().store();
    let products: Vec<ProductInfo> = store
        .product_names()
        .into_iter()
        .filter_map(|name| {
            store.get(&name).map(|data| ProductInfo {
                name: name.clone(),
                usable: data.is_usable(),
                chunks: data.chunk_count(),
            })
        })
        .collect();
    let count = products.len();
    Json(ProductsResponse { products, count })
}

/// GET /api/products/:name - detail for one product
async fn get_product(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ProductInfo>> {
    let data = state
        .chatbot()
        .store()
        .get(&name)
        .ok_or_else(|| Error::ProductNotFound(name.clone()))?;

    Ok(Json(ProductInfo {
        name,
        usable: data.is_usable(),
        chunks: data.chunk_count(),
    }))
}

/// GET /api/info - service description
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.chatbot().store();
    Json(serde_json::json!({
        "name": "product-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "default_product": state.chatbot().default_product(),
        "completion_model": state.config().completion.model,
        "top_k": state.config().retrieval.top_k,
        "products": store.len(),
        "products_usable": store.usable_len(),
        "endpoints": {
            "POST /api/chat": "Answer a message about a product",
            "GET /api/products": "List products",
            "GET /api/products/:name": "Product detail",
            "GET /api/info": "Service description",
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::Chatbot;
    use crate::config::ChatbotConfig;
    use crate::embeddings::testing::StubEmbedder;
    use crate::generation::testing::StubCompletion;
    use crate::generation::WELCOME_MESSAGE;
    use crate::store::format::{chunk_path, index_path, ChunkFile, IndexFile};
    use crate::store::ProductStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    const QUERY: &str = "what payment methods do you accept";

    fn test_state(root: &std::path::Path, completion: Arc<StubCompletion>) -> AppState {
        let store = Arc::new(ProductStore::load(root).unwrap());
        let embedder = Arc::new(StubEmbedder::new(3).with_response(QUERY, vec![1.0, 0.0, 0.0]));
        let chatbot = Chatbot::from_parts(store, embedder, completion, "Acme", 3);
        AppState::from_chatbot(chatbot, ChatbotConfig::default())
    }

    fn write_acme(root: &std::path::Path) {
        let dir = root.join("Acme");
        let embeddings = vec![vec![1.0, 0.0, 0.0]];
        IndexFile {
            dimensions: 3,
            vectors: embeddings.clone(),
        }
        .write_to(&index_path(&dir))
        .unwrap();
        ChunkFile {
            chunks: vec!["We accept credit card and bank transfer.".to_string()],
            embeddings,
        }
        .write_to(&chunk_path(&dir))
        .unwrap();
    }

    #[tokio::test]
    async fn test_chat_route_grounded() {
        let tmp = TempDir::new().unwrap();
        write_acme(tmp.path());
        let state = test_state(
            tmp.path(),
            Arc::new(StubCompletion::ok("We accept credit card and bank transfer.")),
        );

        let response = chat(
            State(state),
            Json(ChatRequest {
                message: QUERY.to_string(),
                product: Some("Acme".to_string()),
            }),
        )
        .await;

        assert_eq!(response.0.answer, "We accept credit card and bank transfer.");
        assert_eq!(response.0.product, "Acme");
        assert_eq!(response.0.passages_used, 1);
    }

    #[tokio::test]
    async fn test_chat_route_defaults_product() {
        let tmp = TempDir::new().unwrap();
        write_acme(tmp.path());
        let state = test_state(tmp.path(), Arc::new(StubCompletion::ok("Grounded.")));

        let response = chat(
            State(state),
            Json(ChatRequest {
                message: QUERY.to_string(),
                product: None,
            }),
        )
        .await;

        assert_eq!(response.0.product, "Acme");
        assert_eq!(response.0.answer, "Grounded.");
    }

    #[tokio::test]
    async fn test_chat_route_welcome_for_unknown_product() {
        let tmp = TempDir::new().unwrap();
        write_acme(tmp.path());
        let state = test_state(tmp.path(), Arc::new(StubCompletion::ok("unused")));

        let response = chat(
            State(state),
            Json(ChatRequest {
                message: QUERY.to_string(),
                product: Some("Ghost".to_string()),
            }),
        )
        .await;

        assert_eq!(response.0.answer, WELCOME_MESSAGE);
        assert_eq!(response.0.passages_used, 0);
    }

    #[tokio::test]
    async fn test_info_route_reports_service_shape() {
        let tmp = TempDir::new().unwrap();
        write_acme(tmp.path());
        let state = test_state(tmp.path(), Arc::new(StubCompletion::ok("unused")));

        let body = info(State(state)).await;
        assert_eq!(body.0["name"], "product-chat");
        assert_eq!(body.0["top_k"], 3);
        assert_eq!(body.0["products"], 1);
        assert_eq!(body.0["products_usable"], 1);
    }

    #[tokio::test]
    async fn test_products_routes() {
        let tmp = TempDir::new().unwrap();
        write_acme(tmp.path());
        let state = test_state(tmp.path(), Arc::new(StubCompletion::ok("unused")));

        let listing = list_products(State(state.clone())).await;
        assert_eq!(listing.0.count, 1);
        assert_eq!(listing.0.products[0].name, "Acme");
        assert!(listing.0.products[0].usable);

        let detail = get_product(State(state.clone()), Path("Acme".to_string()))
            .await
            .unwrap();
        assert!(detail.0.usable);
        assert_eq!(detail.0.chunks, 1);

        let missing = get_product(State(state), Path("Ghost".to_string())).await;
        assert!(matches!(missing, Err(Error::ProductNotFound(_))));
    }
}
