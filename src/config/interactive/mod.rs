
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, OpenAiConfig};

const VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Voice RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("OpenAI Configuration").bold().yellow());
    eprintln!("Configure the API used for embeddings, answers and speech.");
    eprintln!();

    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Index Configuration").bold().yellow());
    configure_index(&mut config)?;

    eprintln!();
    if config.openai.api_key().is_ok() {
        eprintln!(
            "{}",
            style(format!("✓ {} is set", config.openai.api_key_env)).green()
        );
    } else {
        eprintln!(
            "{}",
            style(format!(
                "⚠ Warning: {} is not set in this environment",
                config.openai.api_key_env
            ))
            .yellow()
        );
        eprintln!("You can continue, but export the key before building or querying.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("OpenAI Settings:").bold().yellow());
    match config.openai.base_url() {
        Ok(url) => eprintln!("  Base URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Base URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  API Key Variable: {}", style(&config.openai.api_key_env).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.openai.embedding_model).cyan()
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());
    eprintln!(
        "  Transcription Model: {}",
        style(&config.openai.transcription_model).cyan()
    );
    eprintln!(
        "  Speech Model: {} (voice: {})",
        style(&config.openai.speech_model).cyan(),
        style(&config.openai.voice).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.openai.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Index Settings:").bold().yellow());
    let paths = config.index_paths();
    eprintln!(
        "  Documents: {}",
        style(config.index.documents_dir.display()).cyan()
    );
    eprintln!("  Extensions: {}", style(config.index.extensions.join(", ")).cyan());
    eprintln!("  Vectors File: {}", style(paths.vectors.display()).cyan());
    eprintln!("  Chunks File: {}", style(paths.chunks.display()).cyan());
    eprintln!("  Top-k: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Assistant Settings:").bold().yellow());
    eprintln!(
        "  Speech File: {}",
        style(config.assistant.speech_file.display()).cyan()
    );
    eprintln!(
        "  Player: {}",
        style(config.assistant.player.as_deref().unwrap_or("(none)")).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let mut temp_config = openai.clone();
            temp_config.set_base_url(input.clone())
        })
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(openai.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Variable name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let voice_index = Select::new()
        .with_prompt("Speech voice")
        .default(voice_position(&openai.voice))
        .items(VOICES)
        .interact()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding requests")
        .default(openai.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 2048 {
                Err("Batch size must be 2048 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    openai.set_base_url(base_url)?;
    openai.api_key_env = api_key_env.trim().to_string();
    openai.set_embedding_model(embedding_model)?;
    openai.set_chat_model(chat_model)?;
    openai.set_voice(VOICES[voice_index].to_string())?;
    openai.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_index(config: &mut Config) -> Result<()> {
    let documents_dir: String = Input::new()
        .with_prompt("Documents directory")
        .default(config.index.documents_dir.display().to_string())
        .validate_with(non_empty)
        .interact_text()?;

    let vectors_file: String = Input::new()
        .with_prompt("Vectors file")
        .default(config.index.vectors_file.display().to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if Path::new(input).file_name().is_some() {
                Ok(())
            } else {
                Err("Vectors file must name a file")
            }
        })
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Chunks retrieved per question (top-k)")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Top-k must be between 1 and 100")
            }
        })
        .interact_text()?;

    let player: String = Input::new()
        .with_prompt("Audio player command (blank to keep speech files)")
        .default(config.assistant.player.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    config.index.documents_dir = PathBuf::from(documents_dir.trim());
    config.index.vectors_file = PathBuf::from(vectors_file.trim());
    config.retrieval.set_top_k(top_k)?;
    config.assistant.player = normalize_player(&player);

    Ok(())
}

#[allow(clippy::ptr_arg)]
fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}

fn voice_position(voice: &str) -> usize {
    VOICES.iter().position(|&v| v == voice).unwrap_or(4)
}

fn normalize_player(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
