//! The two external models the engine talks to: an embedding model (text to vector)
//! and a language model (prompt to answer). [`crate::ollama::OllamaClient`] implements
//! both; tests plug in in-process fakes.

use async_trait::async_trait;

use crate::ollama::OllamaError;

const DIMENSION_PROBE: &str = "dimension";

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One embedding per input text, all of the provider's fixed length.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Length of the vectors this provider produces. Probes with a one-word input by default.
    async fn dimension(&self) -> Result<usize, ProviderError> {
        let vectors = encode_checked(self, &[DIMENSION_PROBE.to_string()]).await?;
        match vectors.first().map(Vec::len) {
            Some(d) if d > 0 => Ok(d),
            _ => Err(ProviderError::EmptyEmbedding),
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Calls `provider.encode` and checks that it returned exactly one vector per input.
pub async fn encode_checked<P>(provider: &P, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>
where
    P: EmbeddingProvider + ?Sized,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = provider.encode(texts).await?;
    if vectors.len() != texts.len() {
        return Err(ProviderError::CountMismatch {
            requested: texts.len(),
            returned: vectors.len(),
        });
    }
    Ok(vectors)
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error("embedding provider returned {returned} vectors for {requested} inputs")]
    CountMismatch { requested: usize, returned: usize },
    #[error("embedding provider returned an empty vector")]
    EmptyEmbedding,
    #[error("{0}")]
    Other(String),
}
