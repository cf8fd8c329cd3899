//! All retrieval logic independent of how it is run (CLI or a server in front of it).
//!
//! Documents are chunked ([chunks]), embedded by an external model ([provider],
//! [ollama]), and kept in an exhaustive-search vector index ([store]) persisted to the
//! app data directory (see [app_data]). Questions are answered from the nearest chunks
//! ([retrieval]). [engine] ties these together.

pub mod app_data;
pub mod chunks;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod ollama;
pub mod provider;
pub mod retrieval;
pub mod shared;
pub mod sources;
pub mod store;

pub use app_data::{app_data_dir, default_index_dir};
pub use chunks::{chunk, chunk_document, ChunkConfig, ChunkError, ChunkRecord, ChunkedDocument, Origin};
pub use config::{load_config, save_config, set_documents_root, set_kb_root, Config, ConfigError};
pub use engine::{Engine, EngineError, EngineSettings};
pub use ingest::{ingest_documents, IngestError, IngestReport};
pub use ollama::{OllamaClient, OllamaError};
pub use provider::{EmbeddingProvider, LanguageModel, ProviderError};
pub use retrieval::{build_prompt, Answer, RetrievalError, DEFAULT_TOP_K};
pub use shared::{IndexStats, SharedIndex};
pub use sources::{load_kb_articles, scan_documents, Acquired, AcquisitionError, RawDocument};
pub use store::{SearchHit, StoreError, VectorIndex};
