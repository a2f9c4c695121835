//! Corpus traversal: every source file becomes a file unit followed by its
//! function units.

use std::path::Path;

use crate::chunker::{ChunkerConfig, IndexableUnit, extract_function_units};
use crate::languages::detect_language;
use crate::summary::file_unit;
use crate::symbols::{SymbolExtractor, TreeSitterExtractor};

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub chunker: ChunkerConfig,
    /// Non-blank lines kept in each file summary (default: 20).
    pub head_lines: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            head_lines: 20,
        }
    }
}

/// Summary of one traversal.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub files_scanned: usize,
    pub files_unreadable: usize,
    pub file_units: usize,
    pub function_units: usize,
    pub symbols_failed: usize,
    pub duplicates: usize,
    pub oversized: usize,
}

/// Sequential directory walker producing the ordered unit sequence.
pub struct CorpusWalker<E: SymbolExtractor = TreeSitterExtractor> {
    extractor: E,
    config: WalkerConfig,
}

impl CorpusWalker<TreeSitterExtractor> {
    #[must_use]
    pub fn python(config: WalkerConfig) -> Self {
        Self::new(TreeSitterExtractor::python(), config)
    }
}

impl<E: SymbolExtractor> CorpusWalker<E> {
    #[must_use]
    pub fn new(extractor: E, config: WalkerConfig) -> Self {
        Self { extractor, config }
    }

    /// Walk `root` in filesystem enumeration order. No file is filtered for
    /// being hidden or ignored; only the language suffix decides. Symlinks to
    /// files are indexed, symlinked directories are not entered.
    pub fn walk(&self, root: &Path) -> (Vec<IndexableUnit>, WalkReport) {
        let mut units = Vec::new();
        let mut report = WalkReport::default();

        let entries = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!("walk error under {}: {e}", root.display());
                    None
                }
            })
            .filter(|e| detect_language(e.path()).is_some() && is_file(e));

        for entry in entries {
            report.files_scanned += 1;
            let path = entry.path();
            let source_path = path.to_string_lossy().to_string();
            let rel_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            let abs_path = std::path::absolute(path)
                .unwrap_or_else(|_| path.to_path_buf())
                .to_string_lossy()
                .to_string();

            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %source_path, "skipping unreadable file: {e}");
                    report.files_unreadable += 1;
                    continue;
                }
            };

            units.push(file_unit(&rel_path, &abs_path, &text, self.config.head_lines));
            report.file_units += 1;

            let outcome =
                extract_function_units(&self.extractor, &text, &source_path, &self.config.chunker);
            report.function_units += outcome.units.len();
            report.symbols_failed += outcome.failed;
            report.duplicates += outcome.duplicates;
            report.oversized += outcome.oversized;

            tracing::debug!(
                file = %rel_path,
                functions = outcome.units.len(),
                skipped = outcome.failed + outcome.duplicates + outcome.oversized,
            );
            units.extend(outcome.units);
        }

        (units, report)
    }
}

/// Regular file, or a symlink resolving to one.
fn is_file(entry: &ignore::DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file()),
        _ => false,
    }
}
