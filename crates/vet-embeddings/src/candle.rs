//! Candle-based sentence embedder.
//!
//! Runs a BERT-family sentence-transformer (all-MiniLM-L6-v2 by default) on
//! the CPU and mean-pools token states into one vector per input. Inference is
//! deterministic for fixed weights, which the retrieval path relies on.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::cache::{ModelCache, DEFAULT_MODEL_REPO};
use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Maximum sequence length
pub const MAX_SEQ_LENGTH: usize = 256;

/// Candle-based sentence embedder.
pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load the model from cache, downloading it first if needed.
    ///
    /// Fails when the model's hidden size differs from `dimension`.
    pub fn load(cache: &ModelCache, dimension: usize) -> Result<Self, EmbeddingError> {
        let files = cache.fetch()?;
        let mut embedder = Self::load_from_paths(&files.config, &files.tokenizer, &files.weights)?;
        if embedder.info.dimension != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: embedder.info.dimension,
            });
        }
        embedder.info.name = cache.repo_id.clone();
        Ok(embedder)
    }

    /// Load all-MiniLM-L6-v2 with default cache settings
    pub fn load_default() -> Result<Self, EmbeddingError> {
        Self::load(&ModelCache::default(), EMBEDDING_DIM)
    }

    /// Load from explicit file paths
    pub fn load_from_paths(
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
    ) -> Result<Self, EmbeddingError> {
        info!(weights = ?weights_path, "Loading embedding model");

        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(config_path)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::InvalidModel(format!("config.json: {}", e)))?;
        let hidden_size = serde_json::from_str::<serde_json::Value>(&config_str)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(|h| h.as_u64()))
            .map(|h| h as usize)
            .unwrap_or(EMBEDDING_DIM);

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        // SAFETY: the weights file is owned by the model cache and not mutated while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.to_path_buf()], DType::F32, &device)?
        };

        let model = BertModel::load(vb, &config)?;

        info!(
            dim = hidden_size,
            max_seq = MAX_SEQ_LENGTH,
            "Embedding model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            info: ModelInfo {
                name: DEFAULT_MODEL_REPO.to_string(),
                dimension: hidden_size,
                max_sequence_length: MAX_SEQ_LENGTH,
            },
        })
    }

    /// Mean of token states, ignoring padding positions.
    fn mean_pooling(
        &self,
        hidden: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor, EmbeddingError> {
        let mask = attention_mask
            .unsqueeze(2)?
            .broadcast_as(hidden.shape())?
            .to_dtype(DType::F32)?;

        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(summed.broadcast_div(&counts)?)
    }

    /// Token ids and attention mask for one text, truncated but never padded.
    fn encode_input(&self, text: &str) -> Result<(Tensor, Tensor), EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let take = encoding.get_ids().len().min(MAX_SEQ_LENGTH);
        let ids = encoding.get_ids()[..take].to_vec();
        let mask = encoding.get_attention_mask()[..take].to_vec();

        let input_ids = Tensor::from_vec(ids, (1, take), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (1, take), &self.device)?;
        Ok((input_ids, attention_mask))
    }

    /// One forward pass per text, so a vector never depends on its batch mates.
    fn embed_single(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let (input_ids, attention_mask) = self.encode_input(text)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let values: Vec<f32> = self
            .mean_pooling(&hidden, &attention_mask)?
            .squeeze(0)?
            .to_vec1()?;

        if values.len() != self.info.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.info.dimension,
                actual: values.len(),
            });
        }
        Ok(Embedding::new(values))
    }
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_single(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        debug!(count = texts.len(), "Embedding batch");
        texts.iter().map(|text| self.embed_single(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Model-backed tests download ~90MB on first run:
    // cargo test -p vet-embeddings -- --ignored

    #[test]
    #[ignore = "requires model download"]
    fn test_load_model() {
        let embedder = CandleEmbedder::load_default().unwrap();
        assert_eq!(embedder.info().dimension, EMBEDDING_DIM);
        assert_eq!(embedder.info().name, DEFAULT_MODEL_REPO);
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_wrong_dimension_rejected() {
        let result = CandleEmbedder::load(&ModelCache::default(), 768);
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 768,
                actual: EMBEDDING_DIM
            })
        ));
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_embedding_is_deterministic() {
        let embedder = CandleEmbedder::load_default().unwrap();
        let a = embedder.embed("foot and mouth disease symptoms").unwrap();
        let b = embedder.embed("foot and mouth disease symptoms").unwrap();
        assert_eq!(a.values, b.values);
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_related_questions_score_higher() {
        let embedder = CandleEmbedder::load_default().unwrap();
        let query = embedder.embed("my cow has blisters on its hooves").unwrap();
        let fmd = embedder
            .embed("Disease: Foot and Mouth Disease. Symptoms: blisters on feet and mouth")
            .unwrap();
        let bloat = embedder
            .embed("Disease: Bloat. Symptoms: swollen abdomen after grazing legumes")
            .unwrap();
        assert!(query.cosine_similarity(&fmd) > query.cosine_similarity(&bloat));
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_chunked_matches_unbatched() {
        let embedder = CandleEmbedder::load_default().unwrap();
        let texts: Vec<String> = [
            "Bloat",
            "Disease: Foot and Mouth Disease. Symptoms: blisters on feet and mouth, drooling",
            "Mastitis in dairy goats",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();

        let chunked = embedder.embed_chunked(&texts, 2).unwrap();
        for (text, embedding) in texts.iter().zip(&chunked) {
            assert_eq!(embedder.embed(text).unwrap().values, embedding.values);
        }
    }
}
