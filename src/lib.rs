use std::path::PathBuf;

use thiserror::Error;

use crate::openai::ProviderError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Index artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Index is inconsistent: {0}")]
    IndexInconsistent(String),

    #[error("Vector dimension mismatch: index has {expected} dimensions, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index was built with embedding model {index} but queries use {query}; rebuild the index")]
    ModelMismatch { index: String, query: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Failed to access {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    #[inline]
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

pub mod assistant;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod openai;
pub mod retrieval;
pub mod search;
