//! Ingestion pipeline: acquired documents → chunk → embed → append → persist.
//!
//! Per-document problems (unreadable file, nothing but whitespace) are counted in the
//! [`IngestReport`] and skipped. Once chunks go to the embedding model the batch is
//! all-or-nothing: any provider, dimension or persist error aborts and leaves the
//! index as it was.

use std::path::Path;

use serde::Serialize;

use crate::chunks::{chunk_document, ChunkConfig, ChunkError, ChunkRecord};
use crate::provider::{encode_checked, EmbeddingProvider, ProviderError};
use crate::shared::SharedIndex;
use crate::sources::Acquired;
use crate::store::StoreError;

/// What happened to each document handed to [`ingest_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents received, including failed ones.
    pub documents: usize,
    /// `label: reason` for every document that could not be acquired.
    pub failures: Vec<String>,
    /// Documents that produced no non-blank chunk.
    pub empty_documents: usize,
    /// Whitespace-only chunks dropped before embedding.
    pub dropped_chunks: usize,
    pub indexed_chunks: usize,
    /// Index size after this run.
    pub total_entries: usize,
}

/// Chunks every successfully acquired document, embeds all chunks in one batch call,
/// appends them to `index` and persists it to `persist_to`.
///
/// Nothing is appended or persisted when no document yields a chunk.
pub async fn ingest_documents<I>(
    index: &SharedIndex,
    embedder: &dyn EmbeddingProvider,
    documents: I,
    chunking: ChunkConfig,
    persist_to: &Path,
) -> Result<IngestReport, IngestError>
where
    I: IntoIterator<Item = Acquired>,
{
    chunking.validate()?;
    let mut report = IngestReport::default();
    let mut records: Vec<ChunkRecord> = Vec::new();

    for acquired in documents {
        report.documents += 1;
        let doc = match acquired {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("skipping document: {e}");
                report.failures.push(e.to_string());
                continue;
            }
        };
        let chunked = chunk_document(&doc.text, &doc.origin, chunking)?;
        report.dropped_chunks += chunked.dropped;
        if chunked.records.is_empty() {
            tracing::debug!(document = %doc.label(), "no content, skipped");
            report.empty_documents += 1;
            continue;
        }
        tracing::debug!(document = %doc.label(), chunks = chunked.records.len(), "chunked");
        records.extend(chunked.records);
    }

    if records.is_empty() {
        report.total_entries = index.len();
        tracing::info!(
            documents = report.documents,
            failed = report.failures.len(),
            "nothing to index"
        );
        return Ok(report);
    }

    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let embeddings = encode_checked(embedder, &texts).await?;

    report.indexed_chunks = records.len();
    report.total_entries = index.append_and_persist(records, &embeddings, persist_to)?;

    tracing::info!(
        documents = report.documents,
        failed = report.failures.len(),
        empty = report.empty_documents,
        dropped_chunks = report.dropped_chunks,
        indexed = report.indexed_chunks,
        total = report.total_entries,
        "ingestion complete"
    );
    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),
    #[error("embedding error: {0}")]
    Embed(#[from] ProviderError),
    #[error("index error: {0}")]
    Store(#[from] StoreError),
}
