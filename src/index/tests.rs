use super::*;
use crate::embeddings::Embedding;
use crate::embeddings::fake::{FailingEmbedder, KeywordEmbedder};
use crate::openai::ProviderError;
use std::fs;
use tempfile::TempDir;

fn setup_documents(files: &[(&str, &str)]) -> (TempDir, PathBuf, IndexPaths) {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let documents = temp_dir.path().join("documents");
    fs::create_dir_all(&documents).expect("should create documents dir");
    for (name, content) in files {
        fs::write(documents.join(name), content).expect("should write document");
    }
    let paths = IndexPaths::from_vectors_file(temp_dir.path().join("financial_db.json"));
    (temp_dir, documents, paths)
}

/// Drops the last vector of every batch.
struct LossyEmbedder;

impl EmbeddingProvider for LossyEmbedder {
    fn model(&self) -> &str {
        "lossy-test"
    }

    fn embed(&self, _text: &str) -> std::result::Result<Embedding, ProviderError> {
        Ok(vec![1.0])
    }

    fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Embedding>, ProviderError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
    }
}

#[test]
fn build_keeps_chunks_and_vectors_aligned() {
    let (_temp_dir, documents, paths) = setup_documents(&[
        ("1_loan.txt", "Loan rates are 3%."),
        ("2_savings.txt", "Savings rates are 1%."),
        ("3_cards.txt", "Card fees are waived for the first year."),
    ]);
    let embedder = KeywordEmbedder::finance();

    let report = IndexBuilder::new(&embedder, &IndexConfig::default())
        .build(&documents, &paths)
        .expect("build should succeed");

    assert_eq!(report.documents, 3);
    assert_eq!(report.chunks, 3);
    assert_eq!(report.dimension, 4);

    let index = IndexArtifacts::load(&paths).expect("index should load");
    assert_eq!(index.build_id, report.build_id);
    assert_eq!(index.model, "keyword-test");
    assert_eq!(index.chunks.len(), index.vectors.len());
    for (i, chunk) in index.chunks.iter().enumerate() {
        let expected = embedder.embed(chunk).expect("embed should succeed");
        assert_eq!(index.vectors.row(i), Some(expected.as_slice()));
    }
}

#[test]
fn small_embed_slices_preserve_order() {
    let (_temp_dir, documents, paths) = setup_documents(&[
        ("a.txt", "loan"),
        ("b.txt", "saving"),
        ("c.txt", "rate"),
        ("d.txt", "card"),
        ("e.txt", "loan loan"),
    ]);

    IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default())
        .with_embed_slice(2)
        .build(&documents, &paths)
        .expect("build should succeed");

    let index = IndexArtifacts::load(&paths).expect("index should load");
    assert_eq!(index.chunks, vec!["loan", "saving", "rate", "card", "loan loan"]);
    assert_eq!(index.vectors.row(4), Some([2.0, 0.0, 0.0, 0.0].as_slice()));
}

#[test]
fn empty_directory_builds_empty_index() {
    let (_temp_dir, documents, paths) = setup_documents(&[]);

    let report = IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default())
        .build(&documents, &paths)
        .expect("build should succeed");

    assert_eq!(report.chunks, 0);
    assert_eq!(report.dimension, 0);

    let index = IndexArtifacts::load(&paths).expect("index should load");
    assert!(index.is_empty());
    assert!(index.vectors.is_empty());
}

#[test]
fn missing_directory_aborts_build() {
    let (temp_dir, _documents, paths) = setup_documents(&[]);

    let error = IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default())
        .build(&temp_dir.path().join("nowhere"), &paths)
        .expect_err("build should fail");

    assert!(matches!(error, RagError::DirectoryNotFound(_)));
    assert!(!paths.vectors.exists());
    assert!(!paths.chunks.exists());
}

#[test]
fn rebuild_is_idempotent() {
    let (_temp_dir, documents, paths) = setup_documents(&[
        ("loan.txt", "Loan rates are 3%."),
        ("savings.txt", "Savings rates are 1%."),
    ]);
    let builder = IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default());

    let first = builder.build(&documents, &paths).expect("first build");
    let first_index = IndexArtifacts::load(&paths).expect("first index");
    let second = builder.build(&documents, &paths).expect("second build");
    let second_index = IndexArtifacts::load(&paths).expect("second index");

    assert_ne!(first.build_id, second.build_id);
    assert_eq!(first_index.chunks, second_index.chunks);
    assert_eq!(first_index.vectors, second_index.vectors);
}

#[test]
fn provider_failure_keeps_previous_index() {
    let (temp_dir, documents, paths) = setup_documents(&[("loan.txt", "Loan rates are 3%.")]);
    IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default())
        .build(&documents, &paths)
        .expect("initial build should succeed");
    let before = IndexArtifacts::load(&paths).expect("initial index");

    fs::write(documents.join("savings.txt"), "Savings rates are 1%.").expect("should add document");
    let error = IndexBuilder::new(FailingEmbedder, &IndexConfig::default())
        .build(&documents, &paths)
        .expect_err("build should fail");

    assert!(matches!(error, RagError::Provider(ProviderError::Server(503))));
    let after = IndexArtifacts::load(&paths).expect("previous index should survive");
    assert_eq!(before, after);

    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
        .expect("dir should be readable")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn short_provider_response_fails_build() {
    let (_temp_dir, documents, paths) = setup_documents(&[("a.txt", "a"), ("b.txt", "b")]);

    let error = IndexBuilder::new(LossyEmbedder, &IndexConfig::default())
        .build(&documents, &paths)
        .expect_err("build should fail");

    assert!(matches!(error, RagError::IndexInconsistent(_)));
    assert!(!paths.exists());
}

#[test]
fn custom_chunker_is_used() {
    struct LinesChunker;

    impl Chunker for LinesChunker {
        fn split(&self, documents: &[Document]) -> Vec<String> {
            documents
                .iter()
                .flat_map(|document| document.content.lines())
                .map(str::to_string)
                .collect()
        }
    }

    let (_temp_dir, documents, paths) =
        setup_documents(&[("rates.txt", "Loan rates are 3%.\nSavings rates are 1%.")]);

    let report = IndexBuilder::new(KeywordEmbedder::finance(), &IndexConfig::default())
        .with_chunker(LinesChunker)
        .build(&documents, &paths)
        .expect("build should succeed");

    assert_eq!(report.documents, 1);
    assert_eq!(report.chunks, 2);
}
