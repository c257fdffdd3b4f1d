use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Application configuration, stored as JSON in the platform config
/// directory. The `--api-url` flag and `BITEBOT_API_URL` override it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub api_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self { api_url: None }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        Ok(())
    }

    /// Resolve the backend URL: flag beats env beats config file beats default.
    pub fn resolve_api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| std::env::var("BITEBOT_API_URL").ok())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("bitebot").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_default_url() {
        let config = Config::new();
        assert_eq!(config.resolve_api_url(None), DEFAULT_API_URL);
    }

    #[test]
    fn flag_beats_config_file() {
        let config = Config {
            api_url: Some("http://config:8000".to_string()),
        };
        let url = config.resolve_api_url(Some("http://flag:8000".to_string()));
        assert_eq!(url, "http://flag:8000");
    }

    #[test]
    fn config_file_value_used_without_flag() {
        let config = Config {
            api_url: Some("http://config:8000".to_string()),
        };
        assert_eq!(config.resolve_api_url(None), "http://config:8000");
    }
}
