//! Build orchestrator: walk → embed in batches → commit to the store.

use std::path::Path;
use std::sync::Arc;

use coderag_llm::LlmProvider;

use crate::chunker::IndexableUnit;
use crate::embedder::Embedder;
use crate::error::Result;
use crate::store::{IndexStore, MetadataRecord};
use crate::symbols::SymbolExtractor;
use crate::walker::{CorpusWalker, WalkReport};

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Units per embedding call (default: 50).
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// Summary of a build run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub walk: WalkReport,
    pub units: usize,
    pub batches_committed: usize,
    pub batches_skipped: usize,
    pub rows_written: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Embeds units and persists them, one batch at a time.
pub struct CodeIndexer<P> {
    embedder: Embedder<P>,
    config: IndexerConfig,
}

impl<P: LlmProvider> CodeIndexer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, dimension: usize, config: IndexerConfig) -> Self {
        Self {
            embedder: Embedder::new(provider, dimension),
            config,
        }
    }

    /// Walk `root` and build the store from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created or persisted. Failed
    /// embedding batches are recorded in the report, not returned.
    pub async fn index_project<E: SymbolExtractor>(
        &self,
        walker: &CorpusWalker<E>,
        root: &Path,
        store: &IndexStore,
    ) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        let (units, walk) = walker.walk(root);
        tracing::info!(
            files = walk.files_scanned,
            units = units.len(),
            codebase = store.name(),
            "walk complete"
        );

        let mut report = self.build(&units, store).await?;
        report.walk = walk;
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        Ok(report)
    }

    /// Embed `units` in order and commit each successful batch. The index is
    /// persisted once, after the last batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created or persisted.
    pub async fn build(&self, units: &[IndexableUnit], store: &IndexStore) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        let mut report = IndexReport {
            units: units.len(),
            ..IndexReport::default()
        };
        let mut writer = store.create_writer(self.embedder.dimension())?;

        let batch_size = self.config.batch_size.max(1);
        let total = units.len().div_ceil(batch_size);

        for (i, batch) in units.chunks(batch_size).enumerate() {
            let first = i * batch_size;
            let range = format!("{first}..{}", first + batch.len());
            let texts: Vec<String> = batch.iter().map(|u| u.text.clone()).collect();

            let vectors = match self.embedder.embed_batch(&texts).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(batch = %range, "skipping batch, embedding failed: {e}");
                    report.batches_skipped += 1;
                    report.errors.push(format!("batch {range}: {e}"));
                    continue;
                }
            };

            let records: Vec<MetadataRecord> = batch.iter().map(IndexableUnit::to_record).collect();
            if let Err(e) = writer.append_batch(&records, &vectors) {
                tracing::warn!(batch = %range, "skipping batch, commit failed: {e}");
                report.batches_skipped += 1;
                report.errors.push(format!("batch {range}: {e}"));
                continue;
            }

            report.batches_committed += 1;
            tracing::info!(
                progress = format_args!("{}/{total}", i + 1),
                rows = writer.rows(),
                "batch committed"
            );
        }

        report.rows_written = writer.finish()?;
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            codebase = store.name(),
            rows = report.rows_written,
            skipped = report.batches_skipped,
            "index persisted"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use coderag_llm::mock::MockProvider;

    use super::*;

    fn units(n: usize) -> Vec<IndexableUnit> {
        (0..n)
            .map(|i| {
                IndexableUnit::function("a.py", &format!("f{i}"), format!("def f{i}(): pass"), String::new())
            })
            .collect()
    }

    #[tokio::test]
    async fn batches_by_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path(), "proj");
        let provider = Arc::new(MockProvider::with_dimension(8));
        let indexer = CodeIndexer::new(Arc::clone(&provider), 8, IndexerConfig { batch_size: 2 });

        let report = indexer.build(&units(5), &store).await.unwrap();
        assert_eq!(provider.embed_calls(), 3);
        assert_eq!(report.batches_committed, 3);
        assert_eq!(report.rows_written, 5);
        assert_eq!(store.load().unwrap().records.len(), 5);
    }

    #[tokio::test]
    async fn failed_batch_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path(), "proj");
        let provider = Arc::new(MockProvider::with_dimension(8).failing_embed_calls([0]));
        let indexer = CodeIndexer::new(provider, 8, IndexerConfig { batch_size: 2 });

        let report = indexer.build(&units(3), &store).await.unwrap();
        assert_eq!(report.batches_skipped, 1);
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.errors.len(), 1);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.records[0].id(), "a.py:f2");
    }

    #[tokio::test]
    async fn wrong_dimension_skips_every_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path(), "proj");
        let indexer = CodeIndexer::new(
            Arc::new(MockProvider::with_dimension(4)),
            8,
            IndexerConfig::default(),
        );

        let report = indexer.build(&units(3), &store).await.unwrap();
        assert_eq!(report.batches_skipped, 1);
        assert_eq!(report.rows_written, 0);
        assert!(store.exists());
    }

    #[tokio::test]
    async fn empty_input_writes_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path(), "proj");
        let provider = Arc::new(MockProvider::with_dimension(4));
        let indexer = CodeIndexer::new(Arc::clone(&provider), 4, IndexerConfig::default());

        let report = indexer.build(&[], &store).await.unwrap();
        assert_eq!(report.rows_written, 0);
        assert_eq!(provider.embed_calls(), 0);
        assert!(store.load().unwrap().index.is_empty());
    }
}
