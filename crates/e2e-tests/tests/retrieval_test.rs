//! Retrieval properties over real on-disk artifacts.
//!
//! Covers determinism, short indexes, empty indexes and ids that have no
//! content record.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};

use e2e_tests::{generated_records, sample_records, TestHarness, DIM};
use vet_embeddings::{Embedding, EmbeddingModel, HashEmbedder};
use vet_vector::{
    ContentStore, FlatIndex, HnswConfig, HnswIndex, IndexManifest, Metric, Retriever,
    VectorIndex, NO_MATCH_KEY,
};

fn load_index(harness: &TestHarness) -> HnswIndex {
    let manifest = IndexManifest::load(&harness.paths.manifest).unwrap();
    HnswIndex::load(
        &harness.paths.index,
        HnswConfig::new(manifest.dimension).with_metric(manifest.metric),
    )
    .unwrap()
}

/// The same query embedded twice by one embedder is bit-identical.
#[test]
fn test_query_embedding_is_deterministic() {
    let embedder = HashEmbedder::new(DIM);
    for query in ["foot and mouth disease symptoms", "மாடு காய்ச்சல்", "x"] {
        let a = embedder.embed(query).unwrap();
        let b = embedder.embed(query).unwrap();
        let a_bits: Vec<u32> = a.values.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.values.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits, "Embedding of {:?} changed between calls", query);
    }
}

/// Chunked batch encoding matches one-at-a-time encoding.
#[test]
fn test_chunked_encoding_matches_single() {
    let embedder = HashEmbedder::new(DIM);
    let texts: Vec<String> = generated_records(23, 7)
        .iter()
        .map(|r| r.embedding_text())
        .collect();

    let chunked = embedder.embed_chunked(&texts, 5).unwrap();
    assert_eq!(chunked.len(), texts.len());
    for (text, embedding) in texts.iter().zip(&chunked) {
        assert_eq!(embedder.embed(text).unwrap().values, embedding.values);
    }
}

/// Repeated retrieval returns the same ids in the same order.
#[tokio::test]
async fn test_retrieval_is_deterministic() {
    let harness = TestHarness::new(generated_records(40, 42));
    let context = harness
        .context(Arc::new(vet_responder::TemplateResponder::new()))
        .await;

    let first: Vec<u64> = context
        .retriever()
        .retrieve("fever and drooling", 5)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    let second: Vec<u64> = context
        .retriever()
        .retrieve("fever and drooling", 5)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

/// Asking for more neighbours than exist returns every vector, no sentinels.
#[test]
fn test_search_with_fewer_vectors_than_k() {
    let harness = TestHarness::new(sample_records()[..2].to_vec());
    let index = load_index(&harness);
    let query = HashEmbedder::new(DIM).embed("swollen abdomen").unwrap();

    let neighbors = index.search(&query, 10).unwrap();

    assert_eq!(neighbors.len(), 2);
    assert!(neighbors.iter().all(|n| n.id != NO_MATCH_KEY));
    assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
}

/// Searching an empty index is an empty result, not an error.
#[test]
fn test_empty_index_search() {
    let harness = TestHarness::new(Vec::new());
    let index = load_index(&harness);
    assert!(index.is_empty());

    let query = HashEmbedder::new(DIM).embed("anything").unwrap();
    assert!(index.search(&query, 3).unwrap().is_empty());
}

/// Ids present in the index but absent from the content store are dropped.
#[test]
fn test_missing_content_ids_are_skipped() {
    let records = sample_records();
    let harness = TestHarness::new(records.clone());
    let index = load_index(&harness);
    assert_eq!(index.len(), records.len());

    // Store covers ids 0..3 only
    let store = ContentStore::from_records(records[..3].to_vec());
    let retriever = Retriever::new(
        Arc::new(HashEmbedder::new(DIM)),
        Arc::new(index),
        Arc::new(store),
    );

    let results = retriever.retrieve("disease", records.len()).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.id < 3));
}

/// The disease query finds the Foot and Mouth Disease record (id 4) in its top 3.
#[tokio::test]
async fn test_disease_query_finds_record_four() {
    let harness = TestHarness::new(sample_records());
    let context = harness
        .context(Arc::new(vet_responder::TemplateResponder::new()))
        .await;

    let results = context
        .retriever()
        .retrieve("foot and mouth disease symptoms", 3)
        .unwrap();

    assert_eq!(results.len(), 3);
    let hit = results.iter().find(|r| r.id == 4).expect("id 4 should be retrieved");
    assert_eq!(hit.record.disease, "Foot and Mouth Disease");
}

/// On random vectors, every stored vector is its own nearest neighbour in
/// both the HNSW index and the exact flat index.
#[test]
fn test_hnsw_agrees_with_flat_on_random_vectors() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    let dim = 32;
    let vectors: Vec<Embedding> = (0..200)
        .map(|_| Embedding::new((0..dim).map(|_| rng.random_range(-1.0..1.0)).collect()))
        .collect();

    let mut hnsw = HnswIndex::create(HnswConfig::new(dim).with_capacity(vectors.len())).unwrap();
    let mut flat = FlatIndex::new(dim, Metric::Cosine);
    for (id, v) in vectors.iter().enumerate() {
        hnsw.add(id as u64, v).unwrap();
        flat.add(id as u64, v).unwrap();
    }

    for (id, v) in vectors.iter().enumerate().step_by(10) {
        assert_eq!(flat.search(v, 1).unwrap()[0].id, id as u64);
        assert_eq!(hnsw.search(v, 1).unwrap()[0].id, id as u64);
    }
}
