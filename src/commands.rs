use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::RagError;
use crate::assistant::{SpeechOutcome, VoiceAssistant};
use crate::config::Config;
use crate::embeddings::OpenAiEmbedder;
use crate::index::{IndexArtifacts, IndexBuilder, IndexPaths, load_documents};
use crate::openai::OpenAiClient;
use crate::retrieval::{INDEX_UNAVAILABLE, Retriever};

fn embedder(config: &Config) -> Result<OpenAiEmbedder> {
    let client = OpenAiClient::new(&config.openai).context("Failed to create OpenAI client")?;
    Ok(OpenAiEmbedder::new(client, &config.openai))
}

fn embedding_progress() -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding chunks {wide_bar}")
    {
        bar.set_style(style);
    }
    bar
}

/// Rebuild the index from the documents directory
#[inline]
pub fn build_index(config: &Config, dir: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let directory = dir.unwrap_or_else(|| config.index.documents_dir.clone());
    let paths = output.map_or_else(|| config.index_paths(), IndexPaths::from_vectors_file);

    eprintln!("{}", style("Building index...").bold().cyan());
    info!(
        "Building index from {} into {}",
        directory.display(),
        paths.vectors.display()
    );

    let builder =
        IndexBuilder::new(embedder(config)?, &config.index).with_progress(embedding_progress());

    let report = match builder.build(&directory, &paths) {
        Ok(report) => report,
        Err(RagError::DirectoryNotFound(path)) => {
            eprintln!(
                "{}",
                style(format!(
                    "'{}' dir does not exist. Create it and put the financial product .txt files in it.",
                    path.display()
                ))
                .red()
            );
            anyhow::bail!("Document directory not found: {}", path.display());
        }
        Err(e) => {
            error!("Index build failed: {}", e);
            return Err(e).context("Index build failed; the previous index was left in place");
        }
    };

    eprintln!();
    eprintln!("{}", style("✓ Complete!").green().bold());
    eprintln!("  Documents: {}", style(report.documents).cyan());
    eprintln!("  Chunks: {}", style(report.chunks).cyan());
    eprintln!("  Dimension: {}", style(report.dimension).cyan());
    eprintln!("  Build ID: {}", style(report.build_id).dim());
    eprintln!("  Vectors: {}", style(report.vectors_path.display()).cyan());
    eprintln!("  Chunks File: {}", style(report.chunks_path.display()).cyan());

    Ok(())
}

/// Print the chunks retrieved for `text`, with their scores
#[inline]
pub fn query(config: &Config, text: &str, k: Option<usize>) -> Result<()> {
    let mut retriever = Retriever::from_config(embedder(config)?, config);
    let k = k.unwrap_or(retriever.default_k());

    let results = match retriever.retrieve(text, k) {
        Ok(results) => results,
        Err(RagError::ArtifactMissing(path)) => {
            info!("No index artifact at {}", path.display());
            eprintln!("{}", style(INDEX_UNAVAILABLE).yellow());
            return Ok(());
        }
        Err(e) => return Err(e).context("Retrieval failed"),
    };

    if results.is_empty() {
        let message = if retriever.index()?.is_empty() {
            "No matching chunks (the index is empty)."
        } else {
            "No chunk scored against this query."
        };
        eprintln!("{}", style(message).yellow());
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{} score {:.4} (chunk {})",
            style(format!("[{}]", rank + 1)).bold(),
            result.score,
            result.index
        );
        println!("{}", result.text);
        println!();
    }

    Ok(())
}

/// Answer a typed question, optionally reading the answer aloud
#[inline]
pub fn ask(config: &Config, question: &str, k: Option<usize>, speak: bool) -> Result<()> {
    let mut assistant =
        VoiceAssistant::from_config(config).context("Failed to set up the assistant")?;

    let answer = assistant.ask(question, k).context("Failed to answer question")?;
    println!("{}", answer.text);

    if speak {
        let outcome = assistant
            .speak(&answer.text)
            .context("Failed to speak the answer")?;
        report_speech(&outcome);
    }

    Ok(())
}

/// Run the full spoken pipeline on a recorded question
#[inline]
pub fn voice(config: &Config, audio: &Path, k: Option<usize>) -> Result<()> {
    if !audio.is_file() {
        anyhow::bail!("Audio file not found: {}", audio.display());
    }

    let mut assistant =
        VoiceAssistant::from_config(config).context("Failed to set up the assistant")?;
    let reply = assistant
        .process_voice_query(audio, k)
        .context("Voice query failed")?;

    eprintln!("{} {}", style("Question:").bold(), reply.transcript);
    println!("{}", reply.answer.text);
    report_speech(&reply.speech);

    Ok(())
}

fn report_speech(outcome: &SpeechOutcome) {
    match outcome {
        SpeechOutcome::Played => {}
        SpeechOutcome::Saved(path) => eprintln!(
            "{} {}",
            style("Speech saved to").dim(),
            style(path.display()).cyan()
        ),
    }
}

/// Show where the index lives and what it contains
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    let paths = config.index_paths();

    eprintln!("{}", style("📊 Voice RAG Status").bold().cyan());
    eprintln!("{}", "=".repeat(50));
    eprintln!();

    eprintln!("{}", style("📁 Documents:").bold().yellow());
    eprintln!("   Directory: {}", config.index.documents_dir.display());
    match load_documents(&config.index.documents_dir, &config.index.extensions) {
        Ok(documents) => eprintln!("   ✅ {} documents", documents.len()),
        Err(RagError::DirectoryNotFound(_)) => eprintln!("   ❌ Directory does not exist"),
        Err(e) => eprintln!("   ⚠️  Unreadable - {}", e),
    }

    eprintln!();
    eprintln!("{}", style("🔍 Index:").bold().yellow());
    eprintln!("   Vectors: {}", paths.vectors.display());
    eprintln!("   Chunks: {}", paths.chunks.display());
    match IndexArtifacts::load(&paths) {
        Ok(index) => {
            eprintln!("   ✅ Build {}", index.build_id);
            eprintln!("   📋 Model: {}", index.model);
            eprintln!("   🧩 Chunks: {}", index.len());
            eprintln!("   🔢 Dimension: {}", index.vectors.dimension());
            eprintln!(
                "   🕒 Built: {}",
                index.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if index.model != config.openai.embedding_model {
                eprintln!(
                    "   ⚠️  Built with {} but {} is configured; rebuild before querying",
                    index.model, config.openai.embedding_model
                );
            }
        }
        Err(RagError::ArtifactMissing(path)) => {
            eprintln!("   ❌ Missing {}", path.display());
            eprintln!("   Run 'voice-rag build' to create it.");
        }
        Err(e) => eprintln!("   ⚠️  Unusable - {}", e),
    }

    eprintln!();
    eprintln!("{}", style("🤖 OpenAI:").bold().yellow());
    eprintln!("   Base URL: {}", config.openai.base_url);
    match config.openai.api_key() {
        Ok(_) => eprintln!("   ✅ {} is set", config.openai.api_key_env),
        Err(e) => eprintln!("   ❌ {}", e),
    }

    Ok(())
}
