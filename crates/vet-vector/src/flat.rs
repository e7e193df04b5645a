//! Exact brute-force index.
//!
//! Scans every stored vector. The knowledge base is a few hundred rows, so a
//! linear scan is cheap and gives exact ranking; it also backs unit tests that
//! need predictable neighbours.

use vet_embeddings::Embedding;

use crate::error::VectorError;
use crate::index::{Metric, Neighbor, VectorIndex};

/// In-memory exact index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    entries: Vec<(u64, Vec<f32>)>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            entries: Vec::new(),
        }
    }

    /// Add a vector under the given id.
    pub fn add(&mut self, id: u64, embedding: &Embedding) -> Result<(), VectorError> {
        if embedding.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.dimension(),
            });
        }
        self.entries.push((id, embedding.values.clone()));
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if query.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.dimension(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .entries
            .iter()
            .map(|(id, values)| Neighbor::new(*id, self.metric.distance(&query.values, values)))
            .collect();

        // Stable sort keeps insertion order between equal distances
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }
}
