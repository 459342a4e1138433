
use tracing::debug;

use crate::index::loader::Document;

/// Strategy turning loaded documents into retrieval units.
///
/// Implementations must be pure: the same documents always yield the same
/// chunks in the same order, since chunk order fixes vector row order.
pub trait Chunker {
    fn split(&self, documents: &[Document]) -> Vec<String>;
}

/// Each document becomes exactly one chunk.
///
/// Documents longer than the embedding model's input limit are not split; the
/// provider rejects them with `InputTooLong` during the build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityChunker;

impl Chunker for IdentityChunker {
    #[inline]
    fn split(&self, documents: &[Document]) -> Vec<String> {
        let chunks: Vec<String> = documents
            .iter()
            .map(|document| document.content.clone())
            .collect();

        debug!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        chunks
    }
}
