mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::secret::Secret;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first setting that cannot be used.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.index.batch_size == 0 {
            bail!("index.batch_size must be at least 1");
        }
        if self.index.embedding_dim == 0 {
            bail!("index.embedding_dim must be at least 1");
        }
        if self.index.head_lines == 0 {
            bail!("index.head_lines must be at least 1");
        }
        Ok(())
    }

    /// Read the API credential from the environment.
    ///
    /// `CODERAG_OPENAI_API_KEY` wins over the conventional `OPENAI_API_KEY`.
    pub fn resolve_secrets(&mut self) {
        let key = std::env::var("CODERAG_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        self.secrets.openai_api_key = key.map(Secret::new);
    }

    /// # Errors
    ///
    /// Returns an error if no API key was resolved.
    pub fn api_key(&self) -> anyhow::Result<&Secret> {
        self.secrets
            .openai_api_key
            .as_ref()
            .context("no API key: set CODERAG_OPENAI_API_KEY or OPENAI_API_KEY")
    }
}
