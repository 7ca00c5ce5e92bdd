use discovery_cli::config::DiscoveryConfig;
use discovery_cli::llm::create_llm_client;
use discovery_llm::client::LlmClient;
use std::io::Write;
use std::path::Path;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_load_reads_sections_and_fills_defaults() {
    let file = write_config(
        r#"
[database]
path = "/tmp/discovery-test.db"

[llm]
provider = "anthropic"
max_retries = 2

[api_keys]
anthropic_api_key = "file-key"

[engine]
answer_batch_size = 3
"#,
    );

    let (config, path) = DiscoveryConfig::load(Some(file.path())).unwrap();

    assert_eq!(path, file.path());
    assert_eq!(config.database.path, Path::new("/tmp/discovery-test.db"));
    assert_eq!(config.llm.provider, "anthropic");
    assert_eq!(config.llm.max_retries, 2);
    assert_eq!(config.llm.max_tokens, 8192);
    assert_eq!(config.llm.retry_backoff_ms, 500);
    assert_eq!(config.api_keys.anthropic_api_key.as_deref(), Some("file-key"));
    assert_eq!(config.engine.answer_batch_size, 3);
    assert_eq!(config.engine.answered_confidence_threshold, 0.8);
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    let err = DiscoveryConfig::load(Some(Path::new("/nonexistent/discovery.toml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
fn test_tilde_in_database_path_is_expanded() {
    let file = write_config("[database]\npath = \"~/discovery/discovery.db\"\n");
    let config = DiscoveryConfig::from_file(file.path()).unwrap();

    if let Some(home) = home::home_dir() {
        assert_eq!(config.database.path, home.join("discovery/discovery.db"));
    }
}

#[test]
fn test_environment_keys_only_fill_gaps() {
    let file = write_config(
        "[database]\npath = \"/tmp/d.db\"\n\n[api_keys]\ngoogle_api_key = \"from-file\"\n",
    );
    let mut config = DiscoveryConfig::from_file(file.path()).unwrap();

    config.fill_keys_from(|name| match name {
        "GOOGLE_API_KEY" => Some("from-env".to_string()),
        "ANTHROPIC_API_KEY" => Some("anthropic-env".to_string()),
        _ => None,
    });

    assert_eq!(config.api_keys.google_api_key.as_deref(), Some("from-file"));
    assert_eq!(
        config.api_keys.anthropic_api_key.as_deref(),
        Some("anthropic-env")
    );
}

#[test]
fn test_blank_environment_key_is_ignored() {
    let mut config = DiscoveryConfig::default();
    config.fill_keys_from(|_| Some("  ".to_string()));
    assert!(config.api_keys.google_api_key.is_none());
}

#[test]
fn test_missing_api_key_is_rejected() {
    let config = DiscoveryConfig::default();
    let err = create_llm_client(&config).err().unwrap();
    assert!(err.to_string().contains("No Google API key"));
}

#[test]
fn test_unknown_provider_is_rejected() {
    let mut config = DiscoveryConfig::default();
    config.llm.provider = "mystery".to_string();
    let err = create_llm_client(&config).err().unwrap();
    assert!(err.to_string().contains("Unknown LLM provider: mystery"));
}

#[test]
fn test_configured_model_is_used() {
    let mut config = DiscoveryConfig::default();
    config.llm.provider = "anthropic".to_string();
    config.llm.model = Some("claude-custom".to_string());
    config.api_keys.anthropic_api_key = Some("key".to_string());

    let client = create_llm_client(&config).unwrap();
    assert_eq!(client.provider_name(), "anthropic");
    assert_eq!(client.model_name(), "claude-custom");
}
