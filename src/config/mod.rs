// Configuration management module
// TOML settings plus the interactive editor used by `voice-rag config`

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    AssistantConfig, Config, ConfigError, IndexConfig, OpenAiConfig, RetrievalConfig,
};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}
