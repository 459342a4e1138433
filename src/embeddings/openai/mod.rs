
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedding, EmbeddingProvider, check_input_length};
use crate::config::OpenAiConfig;
use crate::openai::{OpenAiClient, ProviderError};

const EMBEDDINGS_PATH: &str = "v1/embeddings";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding provider backed by the OpenAI `/v1/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    batch_size: usize,
    max_input_tokens: usize,
}

impl OpenAiEmbedder {
    #[inline]
    pub fn new(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.embedding_model.clone(),
            batch_size: config.batch_size.max(1) as usize,
            max_input_tokens: config.max_input_tokens,
        }
    }

    #[inline]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn request_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ProviderError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbedResponse = self.client.post_json(EMBEDDINGS_PATH, &request)?;
        let mut data = response.data;

        if data.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                data.len()
            )));
        }

        data.sort_by_key(|item| item.index);
        if data.iter().enumerate().any(|(position, item)| position != item.index) {
            return Err(ProviderError::InvalidResponse(
                "Embedding indices do not cover the request".to_string(),
            ));
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    #[inline]
    fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        debug!("Generating embedding for text (length: {})", text.len());
        check_input_length(text, self.max_input_tokens)?;

        self.request_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("Empty embedding response".to_string()))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        for text in texts {
            check_input_length(text, self.max_input_tokens)?;
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            results.extend(self.request_batch(batch)?);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }
}
