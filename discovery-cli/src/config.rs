use config::{Config, ConfigError, File};
use discovery_core::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscoveryConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: discovery_llm::providers::GOOGLE.to_string(),
            model: None,
            max_tokens: 8192,
            temperature: None,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiKeysConfig {
    pub google_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: get_default_db_path(),
            },
            llm: LlmConfig::default(),
            api_keys: ApiKeysConfig::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Load from `path`, or from the default location, writing a commented
    /// default file there on first run.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Message(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = get_config_path();
                write_default_config(&path)?;
                path
            }
        };

        let mut config = Self::from_file(&config_path)?;
        config.fill_keys_from(|name| std::env::var(name).ok());
        Ok((config, config_path))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?;

        let mut config: DiscoveryConfig = builder.try_deserialize()?;

        // Expand tilde in database path
        if config.database.path.starts_with("~") {
            if let Some(home) = home::home_dir() {
                let path_str = config.database.path.to_string_lossy();
                let expanded = path_str.replacen('~', &home.to_string_lossy(), 1);
                config.database.path = PathBuf::from(expanded);
            }
        }

        Ok(config)
    }

    /// Environment keys fill only what the file leaves empty
    pub fn fill_keys_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if self.api_keys.google_api_key.is_none() {
            self.api_keys.google_api_key = non_empty("GOOGLE_API_KEY");
        }
        if self.api_keys.anthropic_api_key.is_none() {
            self.api_keys.anthropic_api_key = non_empty("ANTHROPIC_API_KEY");
        }
    }
}

fn write_default_config(config_path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    if config_path.exists() {
        return Ok(());
    }

    let default_config = format!(
        r#"
[database]
path = "{}"

[llm]
provider = "google"  # Options: google, anthropic
# model = "gemini-2.0-flash"
# max_tokens = 8192
# max_retries = 0
# retry_backoff_ms = 500

[api_keys]
# google_api_key = "your-google-key"
# anthropic_api_key = "your-anthropic-key"

[engine]
# answer_batch_size = 5
# answered_confidence_threshold = 0.8
"#,
        get_default_db_path().display()
    );
    std::fs::write(config_path, default_config)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))
}

fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("discovery/discovery.toml")
    } else {
        PathBuf::from("discovery.toml")
    }
}

fn get_default_db_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join("discovery/discovery.db")
    } else {
        PathBuf::from("discovery.db")
    }
}
