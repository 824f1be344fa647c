//! Configuration management for LinkPilot

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub linkedin: LinkedInConfig,
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Swap the live client for the in-process mock (no network calls)
    #[serde(default)]
    pub mock: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_oauth_base")]
    pub oauth_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_completions_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Where the OAuth callback sends the browser back to
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.linkedin.com".to_string()
}

fn default_oauth_base() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_model() -> String {
    "deepseek/deepseek-chat-v3-0324".to_string()
}

fn default_completions_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load configuration from the default location, then apply environment
    /// overrides for secrets
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let mut config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets can live in the environment instead of on disk, matching the
    /// deployment style of the hosted gateway.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LINKEDIN_CLIENT_ID") {
            self.linkedin.client_id = v;
        }
        if let Ok(v) = std::env::var("LINKEDIN_CLIENT_SECRET") {
            self.linkedin.client_secret = v;
        }
        if let Ok(v) = std::env::var("LINKEDIN_REDIRECT_URI") {
            self.linkedin.redirect_uri = v;
        }
        if let Ok(v) = std::env::var("OPENROUTER_API_KEY") {
            self.generator.api_key = v;
        }
        if let Ok(v) = std::env::var("MOCK_LINKEDIN") {
            self.linkedin.mock = v == "true" || v == "1";
        }
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        let mut config = Self {
            linkedin: LinkedInConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: "http://localhost:3000/api/callback".to_string(),
                mock: false,
                api_base: default_api_base(),
                oauth_base: default_oauth_base(),
            },
            generator: GeneratorConfig {
                api_key: String::new(),
                model: default_model(),
                endpoint: default_completions_endpoint(),
            },
            gateway: GatewayConfig::default(),
        };
        config.apply_env_overrides();
        config
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("LINKPILOT_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("linkpilot").join("config.toml"))
}
