use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 10] = [
    "CODERAG_LLM_BASE_URL",
    "CODERAG_EMBEDDING_MODEL",
    "CODERAG_CHAT_MODEL",
    "CODERAG_VECTOR_DIR",
    "CODERAG_TOP_K",
    "CODERAG_BATCH_SIZE",
    "CODERAG_MAX_UNIT_LENGTH",
    "CODERAG_HEAD_LINES",
    "CODERAG_OPENAI_API_KEY",
    "OPENAI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/coderag.toml")).unwrap();
    assert_eq!(config.llm.embedding_model, "text-embedding-3-small");
    assert_eq!(config.llm.chat_model, "gpt-4o");
    assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.index.batch_size, 50);
    assert_eq!(config.index.max_unit_length, 7500);
    assert_eq!(config.index.head_lines, 20);
    assert_eq!(config.index.embedding_dim, 1536);
    assert_eq!(config.index.vector_dir, PathBuf::from("vector"));
}

#[test]
#[serial]
fn partial_file_fills_defaults() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[llm]
chat_model = "gpt-4o-mini"

[index]
top_k = 8
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.chat_model, "gpt-4o-mini");
    assert_eq!(config.llm.embedding_model, "text-embedding-3-small");
    assert_eq!(config.index.top_k, 8);
    assert_eq!(config.index.batch_size, 50);
}

#[test]
#[serial]
fn malformed_file_errors() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[index\ntop_k = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("CODERAG_TOP_K", "3");
        std::env::set_var("CODERAG_BATCH_SIZE", "10");
        std::env::set_var("CODERAG_VECTOR_DIR", "/tmp/vectors");
        std::env::set_var("CODERAG_CHAT_MODEL", "local-chat");
    }
    let config = Config::load(Path::new("/nonexistent.toml")).unwrap();
    clear_env();

    assert_eq!(config.index.top_k, 3);
    assert_eq!(config.index.batch_size, 10);
    assert_eq!(config.index.vector_dir, PathBuf::from("/tmp/vectors"));
    assert_eq!(config.llm.chat_model, "local-chat");
}

#[test]
#[serial]
fn invalid_numeric_override_ignored() {
    clear_env();
    unsafe { std::env::set_var("CODERAG_TOP_K", "many") };
    let config = Config::load(Path::new("/nonexistent.toml")).unwrap();
    clear_env();
    assert_eq!(config.index.top_k, 5);
}

#[test]
fn validate_rejects_zero_batch_size() {
    let mut config = Config::default();
    config.index.batch_size = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("batch_size"));
}

#[test]
fn validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
#[serial]
fn resolve_secrets_prefers_coderag_key() {
    clear_env();
    unsafe {
        std::env::set_var("OPENAI_API_KEY", "sk-fallback");
        std::env::set_var("CODERAG_OPENAI_API_KEY", "sk-primary");
    }
    let mut config = Config::default();
    config.resolve_secrets();
    clear_env();
    assert_eq!(config.api_key().unwrap().expose(), "sk-primary");
}

#[test]
#[serial]
fn resolve_secrets_falls_back_to_openai_key() {
    clear_env();
    unsafe { std::env::set_var("OPENAI_API_KEY", "sk-fallback") };
    let mut config = Config::default();
    config.resolve_secrets();
    clear_env();
    assert_eq!(config.api_key().unwrap().expose(), "sk-fallback");
}

#[test]
#[serial]
fn missing_key_errors() {
    clear_env();
    let mut config = Config::default();
    config.resolve_secrets();
    assert!(config.api_key().is_err());
}
