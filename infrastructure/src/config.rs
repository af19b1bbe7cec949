//! Start-up configuration, read once from `.env` and the environment.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_TOP_K: usize = 3;

/// Instructions shipped with the binary, used unless
/// `RAG_SYSTEM_PROMPT_PATH` points elsewhere.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../prompts/system_prompt.txt");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown vector backend '{0}' (expected 'qdrant' or 'sqlite')")]
    UnknownBackend(String),

    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("failed to read system prompt from {path}: {source}")]
    SystemPrompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant,
    Sqlite,
}

impl FromStr for VectorBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(VectorBackend::Qdrant),
            "sqlite" => Ok(VectorBackend::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for VectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorBackend::Qdrant => f.write_str("qdrant"),
            VectorBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub log_level: String,
    pub log_json: bool,

    pub ollama_base_url: String,
    pub ollama_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    pub vector_backend: VectorBackend,
    pub qdrant_url: String,
    pub collection_name: String,
    pub payload_field: String,
    pub top_k: usize,
    pub score_threshold: Option<f32>,
    pub db_path: String,

    pub system_prompt_path: Option<PathBuf>,
    /// Where the ingestion process reads source documents from. Informational.
    pub documents_dir: PathBuf,

    /// Values that failed to parse and were replaced by defaults. Collected
    /// here because tracing is not installed yet when the config is read.
    pub warnings: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::load`] but with an explicit env file, which must exist.
    pub fn load_from(env_file: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(env_file).map_err(|source| ConfigError::EnvFile {
            path: env_file.to_path_buf(),
            source,
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let vector_backend: VectorBackend = or("RAG_VECTOR_BACKEND", "qdrant").parse()?;

        let score_threshold = match lookup("RAG_SCORE_THRESHOLD") {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<f32>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warnings.push(format!(
                        "RAG_SCORE_THRESHOLD='{raw}' is not a number; no relevance floor applied"
                    ));
                    None
                }
            },
            _ => None,
        };

        let mut top_k = parse_or(&lookup, &mut warnings, "RAG_TOP_K", DEFAULT_TOP_K);
        if top_k == 0 {
            warnings.push(format!("RAG_TOP_K must be positive; using {DEFAULT_TOP_K}"));
            top_k = DEFAULT_TOP_K;
        }

        let config = Self {
            bind_address: or("RAG_BIND", "0.0.0.0:8000"),
            log_level: or("RAG_LOG", "info"),
            log_json: lookup("RAG_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            ollama_base_url: or("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model: or("OLLAMA_MODEL", "qwen3:8b"),
            embedding_model: or("OLLAMA_EMBEDDING_MODEL", "bge-m3"),
            temperature: parse_or(&lookup, &mut warnings, "OLLAMA_TEMPERATURE", 0.7),
            max_tokens: parse_or(&lookup, &mut warnings, "OLLAMA_MAX_TOKENS", 512),
            vector_backend,
            qdrant_url: or("QDRANT_URL", "http://localhost:6333"),
            collection_name: or("RAG_COLLECTION", "test_questions"),
            payload_field: or("RAG_PAYLOAD_FIELD", "text"),
            top_k,
            score_threshold,
            db_path: or("DB_PATH", "embeddings.db"),
            system_prompt_path: lookup("RAG_SYSTEM_PROMPT_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            documents_dir: PathBuf::from(or("RAG_DOCUMENTS_DIR", "../rag_files")),
            warnings,
        };
        Ok(config)
    }

    pub fn system_prompt(&self) -> Result<String, ConfigError> {
        match &self.system_prompt_path {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|source| ConfigError::SystemPrompt {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

fn parse_or<F, T>(lookup: &F, warnings: &mut Vec<String>, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warnings.push(format!("{key}='{raw}' is invalid; using {default}"));
                default
            }
        },
        None => default,
    }
}
