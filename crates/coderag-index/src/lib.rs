//! Function-level code indexing, exact vector search, and context assembly.
//!
//! Build time: the walker turns a source tree into indexable units (one file
//! summary plus one unit per function), the indexer embeds them in batches and
//! commits each batch to a flat L2 index and a JSONL metadata file in lockstep.
//! Query time: the retriever maps nearest rows back to metadata records, the
//! context module renders them as text, and the answerer hands that text to a
//! chat model.

pub mod answer;
pub mod chunker;
pub mod context;
pub mod embedder;
pub mod error;
pub mod flat;
pub mod indexer;
pub(crate) mod languages;
pub mod retriever;
pub mod store;
pub mod summary;
pub mod symbols;
pub mod walker;

pub use error::{IndexError, Result};
