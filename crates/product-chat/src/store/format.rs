//! On-disk formats for per-product stores
//!
//! Each product directory carries two bincode artifacts: the index file
//! (`hnsw_store/index.hnsw`) with the embedding payload in chunk order, and
//! the chunk file (`chunks.bin`) pairing chunk texts with the embeddings
//! they were indexed under. Position `i` means the same chunk in both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Subdirectory of a product dir that holds the index artifact
pub const INDEX_DIR: &str = "hnsw_store";
/// Index artifact file name
pub const INDEX_FILE: &str = "index.hnsw";
/// Chunk artifact file name
pub const CHUNK_FILE: &str = "chunks.bin";

/// Path of the index artifact inside a product directory
pub fn index_path(product_dir: &Path) -> PathBuf {
    product_dir.join(INDEX_DIR).join(INDEX_FILE)
}

/// Path of the chunk artifact inside a product directory
pub fn chunk_path(product_dir: &Path) -> PathBuf {
    product_dir.join(CHUNK_FILE)
}

/// Serialized vector payload of a product index, in chunk order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
    /// Embedding width every vector must have
    pub dimensions: usize,
    /// One embedding per chunk, position-aligned with the chunk file
    pub vectors: Vec<Vec<f32>>,
}

/// Chunk texts paired with the embeddings they were indexed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFile {
    /// Raw chunk texts
    pub chunks: Vec<String>,
    /// Embedding of each chunk, position-aligned with `chunks`
    pub embeddings: Vec<Vec<f32>>,
}

impl IndexFile {
    /// Decode an index artifact from disk
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let (file, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| Error::store_format(path.display().to_string(), e.to_string()))?;
        Ok(file)
    }

    /// Encode this artifact to disk, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::store_format(path.display().to_string(), e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl ChunkFile {
    /// Decode a chunk artifact from disk
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let (file, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| Error::store_format(path.display().to_string(), e.to_string()))?;
        Ok(file)
    }

    /// Encode this artifact to disk, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::store_format(path.display().to_string(), e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Number of chunks in the artifact
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the artifact holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_chunks() -> ChunkFile {
        ChunkFile {
            chunks: vec!["alpha".to_string(), "beta".to_string()],
            embeddings: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
        }
    }

    #[test]
    fn test_artifact_paths() {
        let dir = Path::new("/data/Acme");
        assert_eq!(
            index_path(dir),
            Path::new("/data/Acme/hnsw_store/index.hnsw")
        );
        assert_eq!(chunk_path(dir), Path::new("/data/Acme/chunks.bin"));
    }

    #[test]
    fn test_write_read_chunk_file() {
        let tmp = TempDir::new().unwrap();
        let path = chunk_path(tmp.path());
        let original = sample_chunks();
        original.write_to(&path).unwrap();
        let loaded = ChunkFile::read_from(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_write_read_index_file() {
        let tmp = TempDir::new().unwrap();
        let path = index_path(tmp.path());
        let original = IndexFile {
            dimensions: 3,
            vectors: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
        };
        original.write_to(&path).unwrap();
        let loaded = IndexFile::read_from(&path).unwrap();
        assert_eq!(loaded, original);
        // write_to created the hnsw_store subdirectory
        assert!(tmp.path().join(INDEX_DIR).is_dir());
    }

    #[test]
    fn test_corrupt_artifact_is_a_format_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CHUNK_FILE);
        std::fs::write(&path, b"\xff\xfe not bincode").unwrap();
        let err = ChunkFile::read_from(&path).unwrap_err();
        assert!(matches!(err, Error::StoreFormat { .. }));
    }

    #[test]
    fn test_missing_artifact_is_io() {
        let tmp = TempDir::new().unwrap();
        let err = ChunkFile::read_from(&tmp.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
