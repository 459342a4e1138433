//! The persisted artifact pair: a vectors file and its chunks file.
//!
//! Row *i* of the vector matrix is the embedding of chunk *i*. Both files carry
//! the `build_id` of the build that wrote them, so a pair assembled from two
//! different builds is detected on load instead of silently returning the wrong
//! chunk for a score.


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::embeddings::Embedding;
use crate::{RagError, Result};

/// Locations of the two artifacts forming one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub vectors: PathBuf,
    pub chunks: PathBuf,
}

impl IndexPaths {
    /// Derive the chunks path as `<stem>_chunks.json` next to the vectors file.
    #[inline]
    pub fn from_vectors_file(vectors: impl Into<PathBuf>) -> Self {
        let vectors = vectors.into();
        let stem = vectors
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let chunks = vectors.with_file_name(format!("{}_chunks.json", stem));
        Self { vectors, chunks }
    }

    /// The first artifact that does not exist, if any.
    #[inline]
    pub fn missing(&self) -> Option<&Path> {
        [&self.vectors, &self.chunks]
            .into_iter()
            .find(|path| !path.is_file())
            .map(PathBuf::as_path)
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.missing().is_none()
    }

    /// Modification times and sizes of both files, used to detect a rebuild.
    #[inline]
    pub fn stamp(&self) -> Option<ArtifactStamp> {
        let file_stamp = |path: &Path| -> Option<(SystemTime, u64)> {
            let metadata = fs::metadata(path).ok()?;
            Some((metadata.modified().ok()?, metadata.len()))
        };

        Some(ArtifactStamp {
            vectors: file_stamp(&self.vectors)?,
            chunks: file_stamp(&self.chunks)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactStamp {
    vectors: (SystemTime, u64),
    chunks: (SystemTime, u64),
}

/// Row-major matrix of embeddings sharing one dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorMatrix {
    dimension: usize,
    rows: Vec<Embedding>,
}

impl VectorMatrix {
    /// Fails with [`RagError::DimensionMismatch`] if any row differs from the first.
    #[inline]
    pub fn new(rows: Vec<Embedding>) -> Result<Self> {
        let dimension = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != dimension) {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: row.len(),
            });
        }
        Ok(Self { dimension, rows })
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Zero for an empty matrix.
    #[inline]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[inline]
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunksFile {
    build_id: Uuid,
    chunks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorsFile {
    build_id: Uuid,
    model: String,
    built_at: DateTime<Utc>,
    dimension: usize,
    vectors: Vec<Embedding>,
}

/// A loaded, verified artifact pair.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexArtifacts {
    pub build_id: Uuid,
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub chunks: Vec<String>,
    pub vectors: VectorMatrix,
}

impl IndexArtifacts {
    #[inline]
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        if let Some(missing) = paths.missing() {
            return Err(RagError::ArtifactMissing(missing.to_path_buf()));
        }

        let chunks_file: ChunksFile = read_json(&paths.chunks)?;
        let vectors_file: VectorsFile = read_json(&paths.vectors)?;

        if chunks_file.build_id != vectors_file.build_id {
            return Err(RagError::IndexInconsistent(format!(
                "chunks file belongs to build {} but vectors file to build {}",
                chunks_file.build_id, vectors_file.build_id
            )));
        }

        let vectors = VectorMatrix::new(vectors_file.vectors)?;
        if !vectors.is_empty() && vectors.dimension() != vectors_file.dimension {
            return Err(RagError::DimensionMismatch {
                expected: vectors_file.dimension,
                actual: vectors.dimension(),
            });
        }

        if chunks_file.chunks.len() != vectors.len() {
            return Err(RagError::IndexInconsistent(format!(
                "{} chunks but {} vectors",
                chunks_file.chunks.len(),
                vectors.len()
            )));
        }

        debug!(
            "Loaded index {} with {} chunks of dimension {}",
            vectors_file.build_id,
            vectors.len(),
            vectors.dimension()
        );

        Ok(Self {
            build_id: vectors_file.build_id,
            model: vectors_file.model,
            built_at: vectors_file.built_at,
            chunks: chunks_file.chunks,
            vectors,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Writes an artifact pair through staging files.
///
/// Nothing at the target paths changes until [`ArtifactWriter::commit`]. Staged
/// files left behind by an abandoned writer are removed when it is dropped.
#[derive(Debug)]
pub struct ArtifactWriter {
    paths: IndexPaths,
    build_id: Uuid,
    staged_chunks: Option<PathBuf>,
    staged_vectors: Option<PathBuf>,
}

impl ArtifactWriter {
    #[inline]
    pub fn new(paths: IndexPaths, build_id: Uuid) -> Self {
        Self {
            paths,
            build_id,
            staged_chunks: None,
            staged_vectors: None,
        }
    }

    #[inline]
    pub const fn build_id(&self) -> Uuid {
        self.build_id
    }

    #[inline]
    pub fn write_chunks(&mut self, chunks: &[String]) -> Result<()> {
        let file = ChunksFile {
            build_id: self.build_id,
            chunks: chunks.to_vec(),
        };
        let staged = self.stage(&self.paths.chunks, &file)?;
        self.staged_chunks = Some(staged);
        Ok(())
    }

    #[inline]
    pub fn write_vectors(
        &mut self,
        model: &str,
        built_at: DateTime<Utc>,
        vectors: &VectorMatrix,
    ) -> Result<()> {
        let file = VectorsFile {
            build_id: self.build_id,
            model: model.to_string(),
            built_at,
            dimension: vectors.dimension(),
            vectors: vectors.rows.clone(),
        };
        let staged = self.stage(&self.paths.vectors, &file)?;
        self.staged_vectors = Some(staged);
        Ok(())
    }

    /// Move both staged files over the targets, chunks first.
    #[inline]
    pub fn commit(mut self) -> Result<()> {
        let (Some(chunks), Some(vectors)) =
            (self.staged_chunks.clone(), self.staged_vectors.clone())
        else {
            return Err(RagError::IndexInconsistent(
                "both artifacts must be written before committing".to_string(),
            ));
        };

        fs::rename(&chunks, &self.paths.chunks)
            .map_err(|e| RagError::file(&self.paths.chunks, e))?;
        self.staged_chunks = None;
        fs::rename(&vectors, &self.paths.vectors)
            .map_err(|e| RagError::file(&self.paths.vectors, e))?;
        self.staged_vectors = None;

        debug!(
            "Committed index {} to {} and {}",
            self.build_id,
            self.paths.vectors.display(),
            self.paths.chunks.display()
        );
        Ok(())
    }

    fn staging_path(&self, target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.{}.tmp", name, self.build_id.simple()))
    }

    fn stage<T: Serialize>(&self, target: &Path, value: &T) -> Result<PathBuf> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RagError::file(parent, e))?;
        }

        let staged = self.staging_path(target);
        let json = serde_json::to_vec(value)?;

        let mut file = fs::File::create(&staged).map_err(|e| RagError::file(&staged, e))?;
        file.write_all(&json)
            .and_then(|()| file.sync_all())
            .map_err(|e| RagError::file(&staged, e))?;

        debug!("Staged {} bytes at {}", json.len(), staged.display());
        Ok(staged)
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        for staged in [self.staged_chunks.take(), self.staged_vectors.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = fs::remove_file(&staged) {
                warn!("Failed to remove staging file {}: {}", staged.display(), e);
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| RagError::file(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RagError::IndexInconsistent(format!("{} is not a valid artifact: {}", path.display(), e))
    })
}
