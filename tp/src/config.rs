//! TaskPilot configuration types and loading

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main TaskPilot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reasoning service configuration
    pub reasoning: ReasoningConfig,

    /// Entity gateway configuration
    pub gateway: GatewayConfig,

    /// Preview store configuration
    pub preview: PreviewConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.reasoning.model.is_empty() {
            return Err(eyre::eyre!("reasoning.model must not be empty"));
        }
        if self.reasoning.timeout_secs == 0 {
            return Err(eyre::eyre!("reasoning.timeout-secs must be greater than zero"));
        }
        if self.reasoning.retry_timeout_secs > self.reasoning.timeout_secs {
            return Err(eyre::eyre!(
                "reasoning.retry-timeout-secs ({}) must not exceed reasoning.timeout-secs ({})",
                self.reasoning.retry_timeout_secs,
                self.reasoning.timeout_secs
            ));
        }
        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            return Err(eyre::eyre!(
                "reasoning.temperature must be in [0.0, 2.0], got {}",
                self.reasoning.temperature
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskpilot.yml
        let local_config = PathBuf::from(".taskpilot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskpilot/taskpilot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskpilot").join("taskpilot.yml");
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

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Reasoning service configuration
///
/// Generation is slow; the primary timeout defaults to ten minutes. The
/// retry timeout is used for the single simplified-prompt retry after a
/// read-timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Generation endpoint base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Primary request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Timeout for the simplified-prompt retry, in seconds
    #[serde(rename = "retry-timeout-secs")]
    pub retry_timeout_secs: u64,

    /// Sampling temperature for the primary request
    pub temperature: f64,

    /// Nucleus sampling parameter for the primary request
    #[serde(rename = "top-p")]
    pub top_p: f64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:latest".to_string(),
            timeout_secs: 600,
            retry_timeout_secs: 60,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

/// Entity gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Remote entity API base URL
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Fixed timeout for entity API calls, in seconds
    ///
    /// Entity reads and writes are fast; failures here are hard errors,
    /// unlike reasoning timeouts.
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8010/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Preview store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Optional time-to-live for stored previews, in seconds
    ///
    /// Absent means previews live until executed or cancelled.
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: Option<u64>,
}
