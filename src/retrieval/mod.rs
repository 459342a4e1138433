//! Online half of the system: embed a question and pull the closest chunks
//! out of the persisted index.


use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::index::{ArtifactStamp, IndexArtifacts, IndexPaths};
use crate::search::{ScoredChunk, search};
use crate::{RagError, Result};

/// Placed between retrieved chunks in a context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Returned in place of a context when no index has been built yet.
pub const INDEX_UNAVAILABLE: &str = "Index does not exist. Please run 'voice-rag build' first.";

const CONTEXT_PREVIEW_CHARS: usize = 300;

/// Join chunk texts in rank order.
#[inline]
pub fn format_context(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .map(|result| result.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[derive(Debug)]
struct CachedIndex {
    // `None` when the files were not both present before loading; never fresh.
    stamp: Option<ArtifactStamp>,
    artifacts: IndexArtifacts,
}

/// Answers queries against the artifact pair at `paths`.
///
/// The pair is loaded on first use and reloaded whenever either file changes on
/// disk, so a rebuild is picked up without restarting.
#[derive(Debug)]
pub struct Retriever<E> {
    embedder: E,
    paths: IndexPaths,
    default_k: usize,
    cache: Option<CachedIndex>,
}

impl<E: EmbeddingProvider> Retriever<E> {
    #[inline]
    pub const fn new(embedder: E, paths: IndexPaths, default_k: usize) -> Self {
        Self {
            embedder,
            paths,
            default_k,
            cache: None,
        }
    }

    #[inline]
    pub fn from_config(embedder: E, config: &Config) -> Self {
        Self::new(embedder, config.index_paths(), config.retrieval.top_k)
    }

    #[inline]
    pub const fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    #[inline]
    pub const fn default_k(&self) -> usize {
        self.default_k
    }

    /// The currently persisted index, reloading it if the files changed.
    #[inline]
    pub fn index(&mut self) -> Result<&IndexArtifacts> {
        let stamp = self.paths.stamp();
        let fresh = matches!(
            (&self.cache, stamp),
            (Some(cached), Some(stamp)) if cached.stamp == Some(stamp)
        );

        if !fresh {
            self.cache = None;
            // `stamp` predates the read, so a rebuild landing mid-load is seen as a change next call.
            let artifacts = IndexArtifacts::load(&self.paths)?;
            info!(
                "Loaded index {} ({} chunks, model {})",
                artifacts.build_id,
                artifacts.len(),
                artifacts.model
            );
            self.cache = Some(CachedIndex { stamp, artifacts });
        }

        self.cache
            .as_ref()
            .map(|cached| &cached.artifacts)
            .ok_or_else(|| RagError::ArtifactMissing(self.paths.vectors.clone()))
    }

    /// Top `k` chunks for `query`, best first.
    ///
    /// Fails with [`RagError::ArtifactMissing`] when no index has been built.
    #[inline]
    pub fn retrieve(&mut self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.index()?;
        let Some(cached) = self.cache.as_ref() else {
            return Err(RagError::ArtifactMissing(self.paths.vectors.clone()));
        };
        let artifacts = &cached.artifacts;

        if artifacts.is_empty() || k == 0 {
            debug!(
                "Nothing to retrieve (index size {}, k {})",
                artifacts.len(),
                k
            );
            return Ok(Vec::new());
        }

        if artifacts.model != self.embedder.model() {
            return Err(RagError::ModelMismatch {
                index: artifacts.model.clone(),
                query: self.embedder.model().to_string(),
            });
        }

        let query_vector = self.embedder.embed(query)?;
        search(&query_vector, &artifacts.vectors, &artifacts.chunks, k)
    }

    /// Context string for `query`, or [`INDEX_UNAVAILABLE`] when no index exists.
    ///
    /// `k` defaults to the configured top-k.
    #[inline]
    pub fn get_context(&mut self, query: &str, k: Option<usize>) -> Result<String> {
        let k = k.unwrap_or(self.default_k);
        let results = match self.retrieve(query, k) {
            Ok(results) => results,
            Err(RagError::ArtifactMissing(path)) => {
                info!("No index at {}; returning placeholder context", path.display());
                return Ok(INDEX_UNAVAILABLE.to_string());
            }
            Err(e) => return Err(e),
        };

        let context = format_context(&results);
        let preview: String = context.chars().take(CONTEXT_PREVIEW_CHARS).collect();
        debug!("[RAG] information search:\n{}...", preview);
        Ok(context)
    }
}
