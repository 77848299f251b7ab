use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::http::default_client;
use crate::provider::EmbeddingProvider;

const MAX_ERROR_BODY: usize = 200;

/// Embedding client for an Ollama-compatible `/api/embeddings` or `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(default_client()?, url, model))
    }

    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            tracing::error!(%status, "embedding service error: {}", truncate(&raw));
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&raw).to_owned(),
            });
        }

        parse_embedding(&raw)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Known response encodings. `embeddings` is checked first so a body carrying
/// both keys resolves to the batch form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Batch { embeddings: Vec<Vec<f32>> },
    Single { embedding: Vec<f32> },
}

impl EmbeddingResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            Self::Batch { embeddings } => embeddings.into_iter().next(),
            Self::Single { embedding } => Some(embedding),
        }
    }
}

/// Resolve a raw response body into a single vector.
///
/// # Errors
///
/// Returns [`LlmError::Json`] if the body is not JSON and
/// [`LlmError::UnexpectedShape`] if it is JSON of an unknown shape or an empty batch.
pub fn parse_embedding(body: &str) -> Result<Vec<f32>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let shape = serde_json::from_value::<EmbeddingResponse>(value)
        .map_err(|_| LlmError::UnexpectedShape(truncate(body).to_owned()))?;
    shape
        .into_vector()
        .ok_or_else(|| LlmError::UnexpectedShape("empty embeddings list".into()))
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
