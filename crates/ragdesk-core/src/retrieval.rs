//! Question answering over the index: embed the question, fetch the nearest chunks,
//! and ask the language model to answer from those chunks alone.

use serde::Serialize;

use crate::chunks::ChunkRecord;
use crate::provider::{encode_checked, EmbeddingProvider, LanguageModel, ProviderError};
use crate::shared::SharedIndex;
use crate::store::{SearchHit, StoreError};

/// Chunks retrieved per question when the caller does not say.
pub const DEFAULT_TOP_K: usize = 2;

/// Keeps the model on the retrieved context. It must refuse rather than guess.
const INSTRUCTION: &str = "Answer the question using ONLY the context below.\n\
If the context does not contain the answer, say \"I don't know\".";

/// The answer plus the chunks it was grounded on, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<ChunkRecord>,
}

/// Builds the prompt: instruction, retrieved texts one per line in the given order,
/// then the question verbatim. An empty `records` gives an empty context section.
pub fn build_prompt(records: &[ChunkRecord], question: &str) -> String {
    let context = records
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{INSTRUCTION}\n\nContext:\n{context}\n\nQuestion:\n{question}\n")
}

/// Embeds `question` and returns the `top_k` nearest chunks with their distances.
pub async fn retrieve(
    index: &SharedIndex,
    embedder: &dyn EmbeddingProvider,
    question: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>, RetrievalError> {
    let query = encode_checked(embedder, &[question.to_string()])
        .await?
        .pop()
        .ok_or(ProviderError::EmptyEmbedding)?;
    let hits = index.search(&query, top_k)?;
    tracing::debug!(top_k, hits = hits.len(), "retrieved context");
    Ok(hits)
}

/// Answers `question` from the `top_k` nearest chunks. An empty index is not an
/// error: the model gets an empty context and is expected to say it doesn't know.
pub async fn answer(
    index: &SharedIndex,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LanguageModel,
    question: &str,
    top_k: usize,
) -> Result<Answer, RetrievalError> {
    let sources: Vec<ChunkRecord> = retrieve(index, embedder, question, top_k)
        .await?
        .into_iter()
        .map(|hit| hit.record)
        .collect();
    let prompt = build_prompt(&sources, question);
    let answer = llm.complete(&prompt).await.map_err(RetrievalError::Completion)?;
    tracing::info!(sources = sources.len(), "answered question");
    Ok(Answer {
        question: question.to_string(),
        answer,
        sources,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding error: {0}")]
    Embed(#[from] ProviderError),
    #[error("language model error: {0}")]
    Completion(ProviderError),
    #[error("index error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::store::VectorIndex;

    struct Fixed(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(vec![self.0.clone(); texts.len()])
        }
    }

    /// Remembers the last prompt and answers with a canned string.
    #[derive(Default)]
    struct Recorder(Mutex<Option<String>>);

    #[async_trait]
    impl LanguageModel for Recorder {
        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            *self.0.lock().unwrap() = Some(prompt.to_string());
            Ok("canned".to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl LanguageModel for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Other("model offline".into()))
        }
    }

    fn record(text: &str) -> ChunkRecord {
        ChunkRecord {
            text: text.to_string(),
            source: "kb.json".to_string(),
            sequence: 1,
            title: None,
            external_id: None,
        }
    }

    fn abc_index() -> SharedIndex {
        let mut index = VectorIndex::new(3).unwrap();
        index
            .append(
                vec![record("A"), record("B"), record("C")],
                &[vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![5.0, 5.0, 5.0]],
            )
            .unwrap();
        SharedIndex::new(index)
    }

    #[test]
    fn prompt_layout() {
        let prompt = build_prompt(&[record("first"), record("second")], "What now?");
        assert!(prompt.contains("ONLY the context"));
        assert!(prompt.contains("I don't know"));
        assert!(prompt.contains("Context:\nfirst\nsecond\n\nQuestion:\nWhat now?"));
        assert!(prompt.find("first").unwrap() < prompt.find("second").unwrap());
    }

    #[test]
    fn prompt_with_no_context() {
        let prompt = build_prompt(&[], "Anything?");
        assert!(prompt.contains("Context:\n\n\nQuestion:\nAnything?"));
    }

    #[tokio::test]
    async fn answer_uses_nearest_sources_in_order() {
        let index = abc_index();
        let llm = Recorder::default();
        let result = answer(&index, &Fixed(vec![0.1, 0.0, 0.0]), &llm, "Which?", 2)
            .await
            .unwrap();

        assert_eq!(result.question, "Which?");
        assert_eq!(result.answer, "canned");
        let texts: Vec<&str> = result.sources.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        let prompt = llm.0.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Context:\nA\nB\n"));
    }

    #[tokio::test]
    async fn answer_on_empty_index_still_asks_model() {
        let index = SharedIndex::new(VectorIndex::new(3).unwrap());
        let llm = Recorder::default();
        let result = answer(&index, &Fixed(vec![0.0; 3]), &llm, "Anyone?", 5)
            .await
            .unwrap();
        assert!(result.sources.is_empty());
        assert_eq!(result.answer, "canned");
        assert!(llm.0.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn wrong_query_dimension_fails() {
        let index = abc_index();
        let err = answer(&index, &Fixed(vec![0.0; 4]), &Recorder::default(), "?", 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Store(StoreError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let index = abc_index();
        let err = answer(&index, &Fixed(vec![0.0; 3]), &Failing, "?", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Completion(_)));
    }
}
