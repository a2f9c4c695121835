use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODERAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("CODERAG_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("CODERAG_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("CODERAG_VECTOR_DIR") {
            self.index.vector_dir = PathBuf::from(v);
        }
        if let Some(n) = parse_usize_env("CODERAG_TOP_K") {
            self.index.top_k = n;
        }
        if let Some(n) = parse_usize_env("CODERAG_BATCH_SIZE") {
            self.index.batch_size = n;
        }
        if let Some(n) = parse_usize_env("CODERAG_MAX_UNIT_LENGTH") {
            self.index.max_unit_length = n;
        }
        if let Some(n) = parse_usize_env("CODERAG_HEAD_LINES") {
            self.index.head_lines = n;
        }
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    let v = std::env::var(key).ok()?;
    match v.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}
