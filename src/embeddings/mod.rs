// Embeddings module
// Embedding providers and the chunking strategy applied before embedding

pub mod chunking;
pub mod openai;

#[cfg(test)]
pub(crate) mod fake;

pub use chunking::{Chunker, IdentityChunker};
pub use openai::OpenAiEmbedder;

use crate::openai::ProviderError;

/// A single embedding vector.
pub type Embedding = Vec<f32>;

/// Converts text into fixed-dimension vectors.
///
/// Every vector produced by one provider must have the same dimension, and
/// `embed_batch` must return exactly one vector per input in input order.
pub trait EmbeddingProvider {
    /// Model identifier recorded alongside persisted vectors.
    fn model(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Embedding, ProviderError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ProviderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for &T {
    #[inline]
    fn model(&self) -> &str {
        (**self).model()
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        (**self).embed(text)
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ProviderError> {
        (**self).embed_batch(texts)
    }
}

/// Rough token estimate used to reject inputs the provider would refuse.
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}

/// Fail with [`ProviderError::InputTooLong`] when `text` is estimated above `limit` tokens.
#[inline]
pub fn check_input_length(text: &str, limit: usize) -> Result<(), ProviderError> {
    let tokens = estimate_token_count(text);
    if tokens > limit {
        return Err(ProviderError::InputTooLong { tokens, limit });
    }
    Ok(())
}
