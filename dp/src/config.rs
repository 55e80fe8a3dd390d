//! Day planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ranking/search provider configuration
    pub llm: LlmConfig,

    /// Plan generation settings
    pub planner: PlannerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .dayplanner.yml
        let local_config = PathBuf::from(".dayplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/dayplanner/dayplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dayplanner").join("dayplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Provider configuration for the ranking and search calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the client appends `/chat/completions`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum reply tokens for slot ranking
    #[serde(rename = "ranking-max-tokens")]
    pub ranking_max_tokens: u32,

    /// Maximum reply tokens for article search
    #[serde(rename = "search-max-tokens")]
    pub search_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "perplexity/sonar".to_string(),
            api_key_env: "POLZA_AI_API_KEY".to_string(),
            base_url: "https://api.polza.ai/api/v1".to_string(),
            timeout_ms: 30_000,
            temperature: 0.7,
            ranking_max_tokens: 3000,
            search_max_tokens: 2000,
        }
    }
}

impl LlmConfig {
    /// API key from the configured environment variable
    ///
    /// `None` when unset or blank; that is degraded mode, not an error.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Plan generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Citations requested per task search
    #[serde(rename = "search-limit")]
    pub search_limit: usize,

    /// Pool citations borrowed when a task's own search finds nothing
    #[serde(rename = "fallback-citations")]
    pub fallback_citations: usize,

    /// Directory whose `.pmt` files override the embedded prompts
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search_limit: 2,
            fallback_citations: 2,
            prompts_dir: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding tasks, profile, citations and the last plan
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/dayplanner on Linux)
        let path = dirs::data_dir()
            .map(|d| d.join("dayplanner"))
            .unwrap_or_else(|| PathBuf::from(".dayplanner"))
            .join("store.json");

        Self { path }
    }
}
