use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_chat_model() -> String {
    "gpt-4o".into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_vector_dir() -> PathBuf {
    PathBuf::from("vector")
}

fn default_top_k() -> usize {
    5
}

fn default_batch_size() -> usize {
    50
}

fn default_max_unit_length() -> usize {
    7500
}

fn default_head_lines() -> usize {
    20
}

fn default_embedding_dim() -> usize {
    1536
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Root under which each codebase gets its own `<name>/` store directory.
    #[serde(default = "default_vector_dir")]
    pub vector_dir: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Function units with `len(code) + len(doc)` above this are dropped.
    #[serde(default = "default_max_unit_length")]
    pub max_unit_length: usize,
    /// Non-blank lines kept in a file summary.
    #[serde(default = "default_head_lines")]
    pub head_lines: usize,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            vector_dir: default_vector_dir(),
            top_k: default_top_k(),
            batch_size: default_batch_size(),
            max_unit_length: default_max_unit_length(),
            head_lines: default_head_lines(),
            embedding_dim: default_embedding_dim(),
        }
    }
}
