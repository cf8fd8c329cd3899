//! Persisted config (Ollama endpoint, models, chunking, index location) in the app data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{ChunkConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::ollama::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL};
use crate::retrieval::DEFAULT_TOP_K;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub embed_model: String,
    /// Model that answers questions from retrieved context.
    pub chat_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Fixed embedding dimension. When unset, the embedding model is probed at startup.
    pub dimension: Option<usize>,
    /// Where the index is persisted. Defaults to `<app data>/index`.
    pub index_dir: Option<String>,
    /// Folder of plain-text / markdown documents ingested by default.
    pub documents_root: Option<String>,
    /// Folder of knowledge-base JSON files ingested by default.
    pub kb_root: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            dimension: None,
            index_dir: None,
            documents_root: None,
            kb_root: None,
        }
    }
}

impl Config {
    pub fn chunking(&self) -> ChunkConfig {
        ChunkConfig {
            size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    /// Resolved index directory: the configured one, else the app data default.
    pub fn index_dir(&self) -> Result<PathBuf, ConfigError> {
        match non_empty(&self.index_dir) {
            Some(dir) => Ok(dir),
            None => app_data::default_index_dir().ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn documents_root(&self) -> Option<PathBuf> {
        non_empty(&self.documents_root)
    }

    pub fn kb_root(&self) -> Option<PathBuf> {
        non_empty(&self.kb_root)
    }
}

fn non_empty(value: &Option<String>) -> Option<PathBuf> {
    value.as_deref().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    match app_data::app_data_dir() {
        Some(dir) => load_config_from(&dir.join(CONFIG_FILENAME)),
        None => Config::default(),
    }
}

/// Load config from a specific file. Returns default config if missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
            Config::default()
        }
    }
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    save_config_to(&data_dir.join(CONFIG_FILENAME), config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

/// Set and persist the default documents folder.
pub fn set_documents_root(path: &Path) -> Result<(), ConfigError> {
    let path = canonical_dir(path)?;
    let mut config = load_config();
    config.documents_root = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

/// Set and persist the default knowledge-base folder.
pub fn set_kb_root(path: &Path) -> Result<(), ConfigError> {
    let path = canonical_dir(path)?;
    let mut config = load_config();
    config.kb_root = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

fn canonical_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let path = path.canonicalize().map_err(ConfigError::Canonicalize)?;
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path));
    }
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
