//! Vector index trait and types.
//!
//! Defines the read-only interface used at query time.

use serde::{Deserialize, Serialize};
use vet_embeddings::Embedding;

use crate::error::VectorError;

/// Key usearch reports for an empty result slot.
pub const NO_MATCH_KEY: u64 = u64::MAX;

/// Distance metric, fixed when an index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// 1 - cosine similarity
    #[default]
    Cosine,
    /// Squared Euclidean distance
    L2,
}

impl Metric {
    /// Distance between two vectors under this metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (na * nb)
                }
            }
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Positional record id
    pub id: u64,
    /// Distance under the index metric (lower = closer)
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: u64, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Index statistics
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of vectors in the index
    pub vector_count: usize,
    /// Embedding dimension
    pub dimension: usize,
    /// Distance metric
    pub metric: Metric,
}

/// Trait for read-only vector indexes.
///
/// Implementations must be safe for concurrent read access.
pub trait VectorIndex: Send + Sync {
    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the number of vectors in the index (ntotal)
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance metric of this index
    fn metric(&self) -> Metric;

    /// Search for the k nearest neighbours, closest first.
    ///
    /// Returns at most `min(k, len())` hits and never a sentinel id. An empty
    /// index yields an empty result rather than an error.
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Get index statistics
    fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.len(),
            dimension: self.dimension(),
            metric: self.metric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        let d = Metric::Cosine.distance(&[1.0, 0.0], &[1.0, 0.0]);
        assert!(d.abs() < 1e-6);
        let d = Metric::Cosine.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance_is_squared() {
        let d = Metric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(serde_json::to_string(&Metric::L2).unwrap(), "\"l2\"");
        let m: Metric = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(m, Metric::Cosine);
    }
}
