use std::cell::Cell;

use super::{Embedding, EmbeddingProvider};
use crate::openai::ProviderError;

const KEYWORD_MODEL: &str = "keyword-test";

/// Counts vocabulary stems per dimension so similar wording yields similar vectors.
#[derive(Debug)]
pub(crate) struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    model: &'static str,
    calls: Cell<usize>,
}

impl KeywordEmbedder {
    pub(crate) fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            model: KEYWORD_MODEL,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn with_model(mut self, model: &'static str) -> Self {
        self.model = model;
        self
    }

    pub(crate) fn finance() -> Self {
        Self::new(&["loan", "saving", "rate", "card"])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn model(&self) -> &str {
        self.model
    }

    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();

        Ok(self
            .vocabulary
            .iter()
            .map(|stem| words.iter().filter(|word| word.starts_with(stem)).count() as f32)
            .collect())
    }
}

/// Always fails, for exercising error paths. Claims the keyword model so it can
/// query indexes the keyword embedder built.
#[derive(Debug)]
pub(crate) struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn model(&self) -> &str {
        KEYWORD_MODEL
    }

    fn embed(&self, _text: &str) -> Result<Embedding, ProviderError> {
        Err(ProviderError::Server(503))
    }
}
