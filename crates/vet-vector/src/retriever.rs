//! Query-time retrieval: embed, search, map ids to records.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use vet_embeddings::EmbeddingModel;
use vet_types::ContentRecord;

use crate::error::VectorError;
use crate::index::VectorIndex;
use crate::store::ContentStore;

/// A record returned for a query, with its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedRecord {
    pub id: u64,
    pub distance: f32,
    pub record: ContentRecord,
}

/// Nearest-neighbour retriever over a loaded index and content store.
///
/// All parts are shared read-only; `retrieve` is blocking (embedding runs on
/// the CPU) and should be called off the async executor.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingModel>,
    index: Arc<dyn VectorIndex>,
    store: Arc<ContentStore>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingModel>,
        index: Arc<dyn VectorIndex>,
        store: Arc<ContentStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingModel> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// Return up to `k` records closest to `query`, closest first.
    ///
    /// Ids the index returns but the store lacks are skipped with a warning.
    /// An empty result is a valid "nothing found" outcome.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedRecord>, VectorError> {
        let embedding = self.embedder.embed(query)?;
        let neighbors = self.index.search(&embedding, k)?;

        let mut results = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match self.store.get(neighbor.id) {
                Some(record) => results.push(RetrievedRecord {
                    id: neighbor.id,
                    distance: neighbor.distance,
                    record: record.clone(),
                }),
                None => warn!(id = neighbor.id, "Index returned id with no content record"),
            }
        }

        debug!(k = k, found = results.len(), "Retrieved records");
        Ok(results)
    }
}
