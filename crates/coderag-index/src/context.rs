//! Rendering retrieved records as prompt context.

use crate::retriever::QueryResult;
use crate::store::MetadataRecord;

/// Render one record. File records are re-read from disk; a read failure
/// becomes an inline note instead of an error.
pub async fn format_snippet(record: &MetadataRecord) -> String {
    match record {
        MetadataRecord::Function {
            source, code, doc, ..
        } => format!("# From: {source}\n{code}\n'''{doc}'''"),
        MetadataRecord::File { source, .. } => match tokio::fs::read_to_string(source).await {
            Ok(contents) => format!("# From file: {source}\n{contents}"),
            Err(e) => {
                tracing::warn!(file = %source, "could not reload file for context: {e}");
                format!("# Could not load file: {source} — {e}")
            }
        },
    }
}

/// Snippets of all results in rank order, separated by a blank line.
pub async fn assemble_context(results: &[QueryResult]) -> String {
    let mut snippets = Vec::with_capacity(results.len());
    for result in results {
        snippets.push(format_snippet(&result.record).await);
    }
    snippets.join("\n\n")
}

/// Header printed above each result.
#[must_use]
pub fn display_header(result: &QueryResult) -> String {
    format!("--- [#{}] {} ---", result.rank, result.record.source())
}
