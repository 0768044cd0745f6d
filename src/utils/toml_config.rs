//! TOML-based configuration for course-rag
//!
//! All settings live in a single file (`course-rag.toml` by default). Every
//! section and key has a built-in default, so a missing file or a partial one
//! still yields a usable configuration. Secrets are never stored in the file;
//! it only names the environment variable that holds them.

use crate::db::chromadb::{DEFAULT_DATABASE, DEFAULT_TENANT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "course-rag.toml";

/// Root configuration structure loaded from course-rag.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Directory of static frontend files served as the router fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            frontend_dir: None,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_anthropic_base")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable containing the Anthropic API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    /// Upper bound on tool-use rounds per query
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_anthropic_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_max_tool_rounds() -> usize {
    1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// fastembed BGE-small model (requires the `local-embeddings` feature)
    #[default]
    Fastembed,
    /// Lexical token-hashing embedder, no model download
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Exchanges remembered per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Folder ingested at server startup
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    #[serde(default)]
    pub embedding_provider: EmbeddingProvider,

    /// Vector size of the hashing embedder; fastembed is fixed at 384
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_max_results() -> usize {
    5
}

fn default_max_history() -> usize {
    2
}

fn default_docs_path() -> String {
    "docs".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_results: default_max_results(),
            max_history: default_max_history(),
            docs_path: default_docs_path(),
            embedding_provider: EmbeddingProvider::default(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

// ============= Vector Store Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    #[default]
    Memory,
    Chromadb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub provider: VectorStoreKind,

    /// ChromaDB server URL, used when `provider = "chromadb"`
    #[serde(default = "default_chroma_url")]
    pub url: String,

    #[serde(default = "default_chroma_tenant")]
    pub tenant: String,

    #[serde(default = "default_chroma_database")]
    pub database: String,
}

fn default_chroma_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_chroma_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

fn default_chroma_database() -> String {
    DEFAULT_DATABASE.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreKind::default(),
            url: default_chroma_url(),
            tenant: default_chroma_tenant(),
            database: default_chroma_database(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(&path) {
            Err(ConfigError::FileNotFound(p)) => {
                warn!(path = %p.display(), "Configuration file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric invariants the pipeline relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be greater than 0".to_string(),
            ));
        }
        if rag.chunk_overlap >= rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_results must be greater than 0".to_string(),
            ));
        }
        if rag.max_history == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_history must be greater than 0".to_string(),
            ));
        }
        if rag.embedding_dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "rag.embedding_dimensions must be greater than 0".to_string(),
            ));
        }
        if self.llm.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// Get the Anthropic API key from the environment
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.llm.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.llm.api_key_env.clone()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.max_tokens, 800);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tool_rounds, 1);
        assert_eq!(config.rag.chunk_size, 800);
        assert_eq!(config.rag.chunk_overlap, 100);
        assert_eq!(config.rag.max_results, 5);
        assert_eq!(config.rag.max_history, 2);
        assert_eq!(config.rag.docs_path, "docs");
        assert_eq!(config.rag.embedding_provider, EmbeddingProvider::Fastembed);
        assert_eq!(config.vector_store.provider, VectorStoreKind::Memory);
    }

    #[test]
    fn test_parse_partial_config() {
        let content = r#"
[server]
port = 9000
log_format = "json"

[llm]
max_tool_rounds = 2

[vector_store]
provider = "chromadb"
url = "http://chroma:8000"
database = "courses"
"#;
        let config = AppConfig::from_toml_str(content).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.log_format, "json");
        assert_eq!(config.llm.max_tool_rounds, 2);
        assert_eq!(config.vector_store.provider, VectorStoreKind::Chromadb);
        assert_eq!(config.vector_store.url, "http://chroma:8000");
        assert_eq!(config.vector_store.tenant, "default_tenant");
        assert_eq!(config.vector_store.database, "courses");
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let result = AppConfig::from_toml_str("[rag]\nchunk_size = 100\nchunk_overlap = 100\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_tool_rounds_rejected() {
        let result = AppConfig::from_toml_str("[llm]\nmax_tool_rounds = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result = AppConfig::from_toml_str("[server]\nlog_format = \"xml\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[server\nport = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/course-rag.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let config = AppConfig::load_or_default("/nonexistent/course-rag.toml").unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag]\nmax_results = 3").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.rag.max_results, 3);
    }

    #[test]
    fn test_api_key_missing_env() {
        let mut config = AppConfig::default();
        config.llm.api_key_env = "COURSE_RAG_TEST_UNSET_KEY".to_string();

        let result = config.api_key();
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "COURSE_RAG_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = AppConfig::from_toml_str(include_str!("../../course-rag.toml")).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(shipped.bind_address(), defaults.bind_address());
        assert_eq!(shipped.llm.model, defaults.llm.model);
        assert_eq!(shipped.rag.chunk_size, defaults.rag.chunk_size);
        assert_eq!(shipped.rag.embedding_provider, defaults.rag.embedding_provider);
        assert_eq!(shipped.vector_store.provider, defaults.vector_store.provider);
        assert_eq!(shipped.vector_store.url, defaults.vector_store.url);
    }
}
