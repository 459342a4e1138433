
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::{RagError, Result};

/// Raw text of one source file, named by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

/// Read every file in `directory` whose extension is in `extensions`.
///
/// The scan is not recursive. Files are read in lexical file-name order so the
/// resulting chunk order, and therefore vector row order, is the same on every
/// platform.
#[inline]
pub fn load_documents(directory: &Path, extensions: &[String]) -> Result<Vec<Document>> {
    if !directory.is_dir() {
        return Err(RagError::DirectoryNotFound(directory.to_path_buf()));
    }

    let entries = fs::read_dir(directory).map_err(|e| RagError::file(directory, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RagError::file(directory, e))?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|e| RagError::file(&path, e))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Loaded {} ({} bytes)", name, content.len());
        documents.push(Document { name, content });
    }

    info!(
        "Loaded {} documents from {}",
        documents.len(),
        directory.display()
    );
    Ok(documents)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}
