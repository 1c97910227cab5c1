//! Product store: per-product retrieval artifacts loaded at startup
//!
//! The data root holds one subdirectory per product. Each product
//! contributes an ANN index and a chunk file; either may be missing or
//! unreadable without taking the service down. A product with a broken or
//! absent artifact simply retrieves nothing.

pub mod format;
pub mod index;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::format::{ChunkFile, IndexFile};
use crate::store::index::ProductIndex;

/// Artifacts loaded for a single product
pub struct ProductData {
    /// ANN index, when the index artifact was present and decodable
    pub index: Option<ProductIndex>,
    /// Chunk texts and their embeddings, when the chunk artifact was usable
    pub chunks: Option<ChunkFile>,
}

impl ProductData {
    /// Whether retrieval can run against this product
    pub fn is_usable(&self) -> bool {
        self.index.is_some() && self.chunks.is_some()
    }

    /// Number of chunks available for retrieval
    pub fn chunk_count(&self) -> usize {
        self.chunks.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

/// All products discovered under the data root
pub struct ProductStore {
    products: BTreeMap<String, ProductData>,
}

impl ProductStore {
    /// Scan the data root and load every product subdirectory
    ///
    /// Failing to enumerate the root is fatal; everything below it is not.
    /// A product whose artifacts are missing or corrupt stays listed with
    /// empty slots and is logged, never propagated.
    pub fn load(data_root: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(data_root)
            .map_err(|e| Error::data_root(data_root.display().to_string(), e.to_string()))?;

        let mut products = BTreeMap::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| Error::data_root(data_root.display().to_string(), e.to_string()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let data = load_product(&name, &path);
            debug!(
                "Product '{}': index={}, chunks={}",
                name,
                data.index.is_some(),
                data.chunk_count()
            );
            products.insert(name, data);
        }

        let usable = products.values().filter(|p| p.is_usable()).count();
        info!(
            "Product store loaded from {}: {} products, {} usable",
            data_root.display(),
            products.len(),
            usable
        );

        Ok(Self { products })
    }

    /// Look up a product by its exact directory name
    pub fn get(&self, product: &str) -> Option<&ProductData> {
        self.products.get(product)
    }

    /// All product names, in sorted order
    pub fn product_names(&self) -> Vec<String> {
        self.products.keys().cloned().collect()
    }

    /// Number of products discovered
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether no products were discovered
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Number of products with both artifacts usable
    pub fn usable_len(&self) -> usize {
        self.products.values().filter(|p| p.is_usable()).count()
    }
}

/// Load one product directory, absorbing every per-product failure
fn load_product(product: &str, dir: &Path) -> ProductData {
    let index_path = format::index_path(dir);
    let index = if index_path.is_file() {
        match IndexFile::read_from(&index_path)
            .and_then(|file| ProductIndex::from_index_file(&file))
        {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("Product '{}': index unusable: {}", product, e);
                None
            }
        }
    } else {
        debug!("Product '{}': no index artifact", product);
        None
    };

    let chunk_path = format::chunk_path(dir);
    let chunks = if chunk_path.is_file() {
        match ChunkFile::read_from(&chunk_path) {
            // Chunk texts and embeddings are parallel sequences; a file that
            // breaks that is corrupt, not partially usable
            Ok(chunks) if chunks.chunks.len() != chunks.embeddings.len() => {
                warn!(
                    "Product '{}': chunk file has {} chunks but {} embeddings, dropping",
                    product,
                    chunks.chunks.len(),
                    chunks.embeddings.len()
                );
                None
            }
            Ok(chunks) => Some(chunks),
            Err(e) => {
                warn!("Product '{}': chunks unusable: {}", product, e);
                None
            }
        }
    } else {
        debug!("Product '{}': no chunk artifact", product);
        None
    };

    ProductData { index, chunks }
}
