use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.openai.base_url, "https://api.openai.com");
    assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
    assert_eq!(config.openai.chat_model, "gpt-4o");
    assert_eq!(config.openai.voice, "nova");
    assert_eq!(config.openai.max_input_tokens, 8191);
    assert_eq!(config.index.documents_dir, PathBuf::from("documents"));
    assert_eq!(config.index.extensions, vec!["txt".to_string()]);
    assert_eq!(config.retrieval.top_k, 2);
    assert_eq!(config.assistant.player, None);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.openai.base_url = "not a url".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.openai.chat_model = "  ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidModel("chat"))
    ));

    let mut invalid_config = config.clone();
    invalid_config.openai.temperature = 2.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.retry_attempts = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.index.extensions = Vec::new();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::NoExtensions)
    ));

    let mut invalid_config = config.clone();
    invalid_config.index.vectors_file = PathBuf::from("..");
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));
}

#[test]
fn toml_serialization() {
    let mut config = Config::default();
    config.assistant.player = Some("mpg123 -q".to_string());
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let parsed: Config = toml::from_str(
        r#"
        [openai]
        chat_model = "gpt-4o-mini"

        [retrieval]
        top_k = 5
        "#,
    )
    .expect("should parse partial toml");

    assert_eq!(parsed.openai.chat_model, "gpt-4o-mini");
    assert_eq!(parsed.openai.embedding_model, "text-embedding-3-small");
    assert_eq!(parsed.retrieval.top_k, 5);
    assert_eq!(parsed.index, IndexConfig::default());
}

#[test]
fn setter_validation() {
    let mut config = Config::default();

    assert!(
        config
            .openai
            .set_base_url("http://localhost:8080".to_string())
            .is_ok()
    );
    assert!(
        config
            .openai
            .set_embedding_model("text-embedding-3-large".to_string())
            .is_ok()
    );
    assert!(config.openai.set_voice("alloy".to_string()).is_ok());
    assert!(config.openai.set_batch_size(128).is_ok());
    assert!(config.retrieval.set_top_k(4).is_ok());

    assert!(config.openai.set_base_url("::".to_string()).is_err());
    assert!(config.openai.set_chat_model(String::new()).is_err());
    assert!(config.openai.set_voice(" ".to_string()).is_err());
    assert!(config.openai.set_batch_size(0).is_err());
    assert!(config.retrieval.set_top_k(101).is_err());

    assert_eq!(config.openai.base_url, "http://localhost:8080");
    assert_eq!(config.retrieval.top_k, 4);
}

#[test]
fn index_paths_derive_chunks_file() {
    let mut config = Config::default();
    config.index.vectors_file = PathBuf::from("data/financial_db.json");

    let paths = config.index_paths();
    assert_eq!(paths.vectors, PathBuf::from("data/financial_db.json"));
    assert_eq!(paths.chunks, PathBuf::from("data/financial_db_chunks.json"));
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::load(temp_dir.path()).expect("should load config successfully");
    assert_eq!(config.openai, OpenAiConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let mut config = Config::load(temp_dir.path().join("nested")).expect("should load defaults");
    config.retrieval.top_k = 3;
    config.openai.voice = "shimmer".to_string();
    config.save().expect("should save config");

    assert!(config.config_file_path().exists());

    let reloaded = Config::load(temp_dir.path().join("nested")).expect("should reload config");
    assert_eq!(reloaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}
