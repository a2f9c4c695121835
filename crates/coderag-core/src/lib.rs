//! Configuration and secret handling shared by the indexer and query commands.

pub mod config;
pub mod secret;

pub use config::Config;
pub use secret::Secret;
