//! In-memory ANN index over a product's embedding payload
//!
//! The on-disk index artifact stores the raw vectors in chunk order; the
//! HNSW graph is rebuilt from them at load time. Graph ids are the chunk
//! positions, so a search hit points straight into the chunk file.

use hnsw_rs::prelude::*;

use crate::error::{Error, Result};
use crate::store::format::IndexFile;

/// Connections per layer (M parameter)
const MAX_NB_CONNECTION: usize = 32;
/// Layer cap for graph construction
const MAX_LAYER: usize = 16;
/// Candidate list size during construction
const EF_CONSTRUCTION: usize = 200;
/// Candidate list size during search
const EF_SEARCH: usize = 100;

/// ANN index over one product's embeddings
pub struct ProductIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    dimensions: usize,
    len: usize,
}

impl ProductIndex {
    /// Build the index from a decoded index artifact
    ///
    /// Every vector must match the artifact's declared dimensionality and be
    /// finite; position `i` in the artifact becomes graph id `i`.
    pub fn from_index_file(file: &IndexFile) -> Result<Self> {
        for (i, vector) in file.vectors.iter().enumerate() {
            if vector.len() != file.dimensions {
                return Err(Error::index(format!(
                    "vector {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    file.dimensions
                )));
            }
            if vector.iter().any(|&v| !v.is_finite()) {
                return Err(Error::index(format!("vector {} contains non-finite values", i)));
            }
        }

        // nb_elem of zero confuses the allocator; an empty graph still works
        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            MAX_NB_CONNECTION,
            file.vectors.len().max(1),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistCosine,
        );

        for (position, vector) in file.vectors.iter().enumerate() {
            let normalized = normalize_vector(vector);
            hnsw.insert((&normalized, position));
        }
        hnsw.set_searching_mode(true);

        Ok(Self {
            hnsw,
            dimensions: file.dimensions,
            len: file.vectors.len(),
        })
    }

    /// k-NN search returning chunk positions in rank order (nearest first)
    ///
    /// May return fewer than `k` positions. An empty index yields an empty
    /// result rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<usize>> {
        if query.len() != self.dimensions {
            return Err(Error::index(format!(
                "query has {} dimensions, expected {}",
                query.len(),
                self.dimensions
            )));
        }
        if query.iter().any(|&v| !v.is_finite()) {
            return Err(Error::index("query contains non-finite values"));
        }
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let normalized = normalize_vector(query);
        let ef_search = (k * 2).max(EF_SEARCH);
        let neighbours: Vec<Neighbour> = self.hnsw.search(&normalized, k, ef_search);

        Ok(neighbours.into_iter().map(|n| n.d_id).collect())
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no vectors
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Embedding width the index was built for
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Scale a vector to unit length for cosine distance
fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return vector.to_vec();
    }
    vector.iter().map(|&x| x / magnitude).collect()
}
