//! The embedding seam shared by the index builder and the query path.

use tracing::debug;

use crate::error::EmbeddingError;

/// Unit-length vector for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Scale `values` to unit length. All-zero input is kept as is.
    pub fn new(mut values: Vec<f32>) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Self { values }
    }

    /// Wrap values that are already unit length.
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Dot product of two unit vectors; 0.0 when the widths differ.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Identity of an embedding model; persisted with every index it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Repository id or other stable model name
    pub name: String,
    pub dimension: usize,
    /// Longest input in tokens; longer input is truncated
    pub max_sequence_length: usize,
}

/// Text to vector.
///
/// The same input must always produce the same output for one model.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// One embedding per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.embed_batch(&refs)
    }

    /// Embed many texts in fixed-size chunks to bound peak memory.
    ///
    /// Output order matches input order.
    fn embed_chunked(
        &self,
        texts: &[String],
        chunk_size: usize,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        if chunk_size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "chunk size must be > 0".to_string(),
            ));
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(chunk_size).enumerate() {
            let batch = self.embed_texts(chunk)?;
            if batch.len() != chunk.len() {
                return Err(EmbeddingError::InvalidInput(format!(
                    "model returned {} embeddings for {} inputs",
                    batch.len(),
                    chunk.len()
                )));
            }
            debug!(chunk = i, size = chunk.len(), "Embedded chunk");
            embeddings.extend(batch);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scales_to_unit_length() {
        let emb = Embedding::new(vec![6.0, 8.0]);
        assert!((emb.values[0] - 0.6).abs() < 1e-6);
        assert!((emb.values[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_is_left_alone() {
        let emb = Embedding::new(vec![0.0, 0.0]);
        assert_eq!(emb.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_of_parallel_and_orthogonal() {
        let a = Embedding::new(vec![2.0, 0.0, 0.0]);
        let b = Embedding::new(vec![5.0, 0.0, 0.0]);
        let c = Embedding::new(vec![0.0, 1.0, 0.0]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
        assert!(a.cosine_similarity(&c).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_of_different_widths_is_zero() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }
}
