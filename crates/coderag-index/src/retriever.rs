//! Query-time retrieval over a persisted codebase index.

use std::sync::Arc;

use coderag_llm::LlmProvider;

use crate::embedder::Embedder;
use crate::error::Result;
use crate::flat::FlatL2Index;
use crate::store::{IndexStore, LoadedIndex, MetadataRecord};

/// Retrieval configuration.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Neighbours requested from the index (default: 5).
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// One retrieved record.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// 1 = nearest.
    pub rank: usize,
    pub distance: f32,
    pub record: MetadataRecord,
}

/// A loaded index ready to answer queries.
pub struct CodeRetriever<P> {
    index: FlatL2Index,
    records: Vec<MetadataRecord>,
    embedder: Embedder<P>,
    config: RetrievalConfig,
}

impl<P: LlmProvider> CodeRetriever<P> {
    /// Load `store`. Nothing is embedded before both files are found.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`](crate::IndexError::NotFound) if the
    /// codebase was never indexed, or a read error if its files are unreadable.
    pub fn open(store: &IndexStore, provider: Arc<P>, config: RetrievalConfig) -> Result<Self> {
        let loaded = store.load()?;
        tracing::debug!(
            codebase = store.name(),
            rows = loaded.index.len(),
            "index loaded"
        );
        Ok(Self::from_loaded(loaded, provider, config))
    }

    /// Wrap an index already loaded with [`IndexStore::load`].
    #[must_use]
    pub fn from_loaded(loaded: LoadedIndex, provider: Arc<P>, config: RetrievalConfig) -> Self {
        let embedder = Embedder::new(provider, loaded.index.dimension());
        Self {
            index: loaded.index,
            records: loaded.records,
            embedder,
            config,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Nearest records to `query`, ascending by distance.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<QueryResult>> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(&vector, self.config.top_k)?;

        let results: Vec<QueryResult> = hits
            .into_iter()
            .filter_map(|hit| {
                let record = self.records.get(hit.row)?;
                Some((hit.distance, record.clone()))
            })
            .enumerate()
            .map(|(i, (distance, record))| QueryResult {
                rank: i + 1,
                distance,
                record,
            })
            .collect();

        tracing::debug!(query, results = results.len(), "retrieval complete");
        Ok(results)
    }
}
