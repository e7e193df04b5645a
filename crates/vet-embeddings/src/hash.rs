//! Feature-hashing embedder.
//!
//! Maps lowercase word tokens and their bigrams into a fixed number of signed
//! buckets. Texts that share vocabulary land close together, which is enough
//! for tests and for exercising the pipeline without downloading a model.

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    info: ModelInfo,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo {
                name: format!("hash-embedder-{}", dimension),
                dimension,
                max_sequence_length: usize::MAX,
            },
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

impl EmbeddingModel for HashEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let dim = self.info.dimension;
        if dim == 0 {
            return Err(EmbeddingError::InvalidInput(
                "dimension must be > 0".to_string(),
            ));
        }

        let words = tokens(text);
        let mut values = vec![0.0f32; dim];

        let mut add = |feature: &str, weight: f32| {
            let hash = fnv1a(feature.as_bytes());
            let bucket = (hash % dim as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign * weight;
        };

        for word in &words {
            add(word, 1.0);
        }
        for pair in words.windows(2) {
            add(&format!("{} {}", pair[0], pair[1]), 0.5);
        }

        Ok(Embedding::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("foot and mouth disease symptoms").unwrap();
        let b = embedder.embed("foot and mouth disease symptoms").unwrap();
        assert_eq!(a.values, b.values);
        assert_eq!(a.dimension(), 64);
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed("foot and mouth disease symptoms").unwrap();
        let related = embedder
            .embed("Disease: Foot and Mouth Disease. Symptoms: fever, blisters")
            .unwrap();
        let unrelated = embedder
            .embed("Disease: Bloat. Symptoms: swollen left flank")
            .unwrap();
        assert!(query.cosine_similarity(&related) > query.cosine_similarity(&unrelated));
    }

    #[test]
    fn test_chunked_matches_unbatched() {
        let embedder = HashEmbedder::new(32);
        let texts: Vec<String> = (0..7).map(|i| format!("record number {}", i)).collect();
        let chunked = embedder.embed_chunked(&texts, 3).unwrap();
        let single = embedder.embed_texts(&texts).unwrap();
        assert_eq!(chunked, single);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let embedder = HashEmbedder::new(32);
        let result = embedder.embed_chunked(&["a".to_string()], 0);
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_text_gives_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let emb = embedder.embed("").unwrap();
        assert!(emb.values.iter().all(|v| *v == 0.0));
    }
}
