//! ONNX-based query embedding
//!
//! Runs all-MiniLM-L6-v2 through ONNX Runtime: tokenize, forward pass,
//! attention-weighted mean pooling, L2 normalization. Model and tokenizer
//! are fetched from HuggingFace into the cache directory on first use.

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::embeddings::{EmbeddingProvider, EMBEDDING_DIMENSIONS, EMBEDDING_MODEL};
use crate::error::{Error, Result};

/// ONNX-based text embedder
pub struct OnnxEmbedder {
    /// ONNX Runtime session; `Session::run` needs exclusive access
    session: Mutex<Session>,
    /// HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Maximum sequence length
    max_length: usize,
}

impl OnnxEmbedder {
    /// Create a new ONNX embedder, downloading model files if not cached
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", EMBEDDING_MODEL);

        std::fs::create_dir_all(&config.cache_dir)
            .map_err(|e| Error::Config(format!("Failed to create cache directory: {}", e)))?;

        let model_path = config.cache_dir.join("model.onnx");
        let tokenizer_path = config.cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            download_model(EMBEDDING_MODEL, &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download_tokenizer(EMBEDDING_MODEL, &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::Embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::Embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::Embedding(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder initialized successfully");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_length: config.max_length,
        })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(format!("Tokenization failed: {}", e)))?;

        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let types = encoding.get_type_ids();
        let len = ids.len().min(self.max_length);
        if len == 0 {
            return Err(Error::Embedding("Tokenizer produced no tokens".to_string()));
        }

        let input_ids: Vec<i64> = ids[..len].iter().map(|&v| v as i64).collect();
        let attention_mask: Vec<i64> = mask[..len].iter().map(|&v| v as i64).collect();
        let token_type_ids: Vec<i64> = types[..len].iter().map(|&v| v as i64).collect();

        let input_ids_tensor = Tensor::from_array((vec![1usize, len], input_ids.into_boxed_slice()))
            .map_err(|e| Error::Embedding(format!("Input tensor creation failed: {}", e)))?;
        let attention_mask_tensor = Tensor::from_array((
            vec![1usize, len],
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(|e| Error::Embedding(format!("Attention mask tensor creation failed: {}", e)))?;
        let token_type_ids_tensor =
            Tensor::from_array((vec![1usize, len], token_type_ids.into_boxed_slice()))
                .map_err(|e| Error::Embedding(format!("Token type tensor creation failed: {}", e)))?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::Embedding(format!("Inference failed: {}", e)))?;

        // Prefer last_hidden_state, fall back to the first output
        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::Embedding("No output tensor".to_string()))?;

        let (tensor_shape, tensor_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Embedding(format!("Failed to extract tensor: {}", e)))?;

        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();
        let hidden_size = dims.get(2).copied().unwrap_or(EMBEDDING_DIMENSIONS);

        // Mean pooling weighted by the attention mask
        let mut sum = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;
        for (j, &mask_val) in attention_mask.iter().enumerate() {
            let mask_val = mask_val as f32;
            if mask_val > 0.0 {
                for (k, value) in sum.iter_mut().enumerate() {
                    let idx = j * hidden_size + k;
                    if idx < tensor_data.len() {
                        *value += tensor_data[idx] * mask_val;
                    }
                }
                count += mask_val;
            }
        }
        if count > 0.0 {
            for val in &mut sum {
                *val /= count;
            }
        }

        // L2 normalize
        let norm: f32 = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut sum {
                *val /= norm;
            }
        }

        Ok(sum)
    }
}

impl EmbeddingProvider for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

/// Download the ONNX model export
async fn download_model(model_name: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/onnx/model.onnx",
        model_name
    );

    tracing::info!("Downloading model from: {}", url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::Embedding(format!("Failed to download model: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::Embedding(format!(
            "Model download failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Embedding(format!("Failed to read model bytes: {}", e)))?;

    std::fs::write(path, &bytes)
        .map_err(|e| Error::Embedding(format!("Failed to save model: {}", e)))?;

    tracing::info!("Model downloaded successfully ({} bytes)", bytes.len());

    Ok(())
}

/// Download the tokenizer definition
async fn download_tokenizer(model_name: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/tokenizer.json",
        model_name
    );

    tracing::info!("Downloading tokenizer from: {}", url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::Embedding(format!("Failed to download tokenizer: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::Embedding(format!(
            "Tokenizer download failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Embedding(format!("Failed to read tokenizer bytes: {}", e)))?;

    std::fs::write(path, &bytes)
        .map_err(|e| Error::Embedding(format!("Failed to save tokenizer: {}", e)))?;

    tracing::info!("Tokenizer downloaded successfully");

    Ok(())
}
