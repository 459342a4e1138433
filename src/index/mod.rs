#[cfg(test)]
mod tests;

pub mod artifacts;
pub mod loader;

pub use artifacts::{ArtifactStamp, ArtifactWriter, IndexArtifacts, IndexPaths, VectorMatrix};
pub use loader::{Document, load_documents};

use chrono::Utc;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::IndexConfig;
use crate::embeddings::{Chunker, EmbeddingProvider, IdentityChunker};
use crate::{RagError, Result};

/// Embedding requests are issued in slices of this many chunks so progress can be reported.
const DEFAULT_EMBED_SLICE: usize = 64;

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub vectors_path: PathBuf,
    pub chunks_path: PathBuf,
}

/// Offline full rebuild: load, chunk, embed, persist.
#[derive(Debug)]
pub struct IndexBuilder<E, C = IdentityChunker> {
    embedder: E,
    chunker: C,
    extensions: Vec<String>,
    embed_slice: usize,
    progress: ProgressBar,
}

impl<E: EmbeddingProvider> IndexBuilder<E> {
    #[inline]
    pub fn new(embedder: E, config: &IndexConfig) -> Self {
        Self {
            embedder,
            chunker: IdentityChunker,
            extensions: config.extensions.clone(),
            embed_slice: DEFAULT_EMBED_SLICE,
            progress: ProgressBar::hidden(),
        }
    }
}

impl<E: EmbeddingProvider, C: Chunker> IndexBuilder<E, C> {
    #[inline]
    pub fn with_chunker<C2: Chunker>(self, chunker: C2) -> IndexBuilder<E, C2> {
        IndexBuilder {
            embedder: self.embedder,
            chunker,
            extensions: self.extensions,
            embed_slice: self.embed_slice,
            progress: self.progress,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_embed_slice(mut self, embed_slice: usize) -> Self {
        self.embed_slice = embed_slice.max(1);
        self
    }

    /// Rebuild the index at `paths` from the documents in `directory`.
    ///
    /// Existing artifacts are replaced only once both new files are complete;
    /// on any error they are left as they were.
    #[inline]
    pub fn build(&self, directory: &Path, paths: &IndexPaths) -> Result<BuildReport> {
        let documents = load_documents(directory, &self.extensions)?;
        info!(
            "[build] '{}' dir - {} documents",
            directory.display(),
            documents.len()
        );

        let chunks = self.chunker.split(&documents);
        info!("[build] {} chunks", chunks.len());

        let mut writer = ArtifactWriter::new(paths.clone(), Uuid::new_v4());
        writer.write_chunks(&chunks)?;
        info!("[build] chunks staged for '{}'", paths.chunks.display());

        let embeddings = self.embed_all(&chunks)?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::IndexInconsistent(format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        let vectors = VectorMatrix::new(embeddings)?;
        info!(
            "[build] {} embeddings created (dimension {})",
            vectors.len(),
            vectors.dimension()
        );

        writer.write_vectors(self.embedder.model(), Utc::now(), &vectors)?;
        let build_id = writer.build_id();
        writer.commit()?;
        info!(
            "[build] index {} saved to '{}' and '{}'",
            build_id,
            paths.vectors.display(),
            paths.chunks.display()
        );

        Ok(BuildReport {
            build_id,
            documents: documents.len(),
            chunks: chunks.len(),
            dimension: vectors.dimension(),
            vectors_path: paths.vectors.clone(),
            chunks_path: paths.chunks.clone(),
        })
    }

    fn embed_all(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        self.progress.set_length(chunks.len() as u64);
        self.progress.set_position(0);

        let mut embeddings = Vec::with_capacity(chunks.len());
        for slice in chunks.chunks(self.embed_slice) {
            embeddings.extend(self.embedder.embed_batch(slice)?);
            self.progress.inc(slice.len() as u64);
        }

        self.progress.finish_and_clear();
        Ok(embeddings)
    }
}
