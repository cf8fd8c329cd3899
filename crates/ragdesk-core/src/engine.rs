//! The running system: one shared index plus the two models, built in a fixed order.
//!
//! 1. Dimension: from settings if pinned, else probed from the embedding model.
//! 2. Index: restored from `index_dir` if persisted there, else empty. Corrupt state
//!    or a dimension change is a startup error.
//! 3. Queries and ingestion share the index through [`SharedIndex`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::chunks::ChunkConfig;
use crate::config::{Config, ConfigError};
use crate::ingest::{ingest_documents, IngestError, IngestReport};
use crate::provider::{EmbeddingProvider, LanguageModel, ProviderError};
use crate::retrieval::{self, Answer, RetrievalError};
use crate::shared::{IndexStats, SharedIndex};
use crate::sources::Acquired;
use crate::store::{SearchHit, StoreError, VectorIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub index_dir: PathBuf,
    pub chunking: ChunkConfig,
    pub top_k: usize,
    /// Skip probing the embedding model and use this dimension.
    pub dimension: Option<usize>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            index_dir: config.index_dir()?,
            chunking: config.chunking(),
            top_k: config.top_k,
            dimension: config.dimension,
        })
    }
}

#[derive(Clone)]
pub struct Engine {
    index: SharedIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LanguageModel>,
    settings: EngineSettings,
}

impl Engine {
    pub async fn start(
        settings: EngineSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self, EngineError> {
        settings.chunking.validate().map_err(|e| EngineError::Settings(e.to_string()))?;
        if settings.top_k == 0 {
            return Err(EngineError::Settings("top_k must be positive".into()));
        }
        let dimension = match settings.dimension {
            Some(d) => d,
            None => embedder.dimension().await?,
        };
        let index = VectorIndex::open(&settings.index_dir, dimension)?;
        tracing::info!(
            entries = index.len(),
            dimension,
            index_dir = %settings.index_dir.display(),
            "engine ready"
        );
        Ok(Self {
            index: SharedIndex::new(index),
            embedder,
            llm,
            settings,
        })
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Answers from the `top_k` nearest chunks (configured default when `None`).
    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<Answer, RetrievalError> {
        retrieval::answer(
            &self.index,
            self.embedder.as_ref(),
            self.llm.as_ref(),
            question,
            top_k.unwrap_or(self.settings.top_k),
        )
        .await
    }

    /// Nearest chunks for `question`, without calling the language model.
    pub async fn search(&self, question: &str, top_k: Option<usize>) -> Result<Vec<SearchHit>, RetrievalError> {
        retrieval::retrieve(
            &self.index,
            self.embedder.as_ref(),
            question,
            top_k.unwrap_or(self.settings.top_k),
        )
        .await
    }

    /// Chunks, embeds and appends `documents`, then persists the index.
    pub async fn ingest<I>(&self, documents: I) -> Result<IngestReport, IngestError>
    where
        I: IntoIterator<Item = Acquired>,
    {
        ingest_documents(
            &self.index,
            self.embedder.as_ref(),
            documents,
            self.settings.chunking,
            &self.settings.index_dir,
        )
        .await
    }

    /// Replaces the in-memory index with what is on disk. Returns the new entry count.
    pub fn reload(&self) -> Result<usize, StoreError> {
        let entries = self.index.reload(&self.settings.index_dir)?;
        tracing::info!(entries, "reloaded index");
        Ok(entries)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("could not determine embedding dimension: {0}")]
    Provider(#[from] ProviderError),
    #[error("could not open index: {0}")]
    Store(#[from] StoreError),
}
