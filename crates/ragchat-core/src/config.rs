use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const BACKEND_URL_ENV: &str = "RAGCHAT_BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub model_type: String,
    pub model_name: String,
    pub use_rag: bool,
    pub use_rerank: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            model_type: "ollama".to_string(),
            model_name: "qwen:7b".to_string(),
            use_rag: false,
            use_rerank: false,
        }
    }

    /// Load from the user config directory, falling back to defaults when no
    /// file exists yet. `RAGCHAT_BACKEND_URL` overrides the stored URL.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_stored(&Self::get_config_path()?)?;

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend_url = url;
            }
        }

        Ok(config)
    }

    /// What is on disk at `path`, without environment overrides.
    fn load_stored(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Remember the last model selection that the backend accepted.
    pub fn save_model(model_type: &str, model_name: &str) -> Result<()> {
        Self::save_model_to(&Self::get_config_path()?, model_type, model_name)
    }

    /// Only the model fields change; a `RAGCHAT_BACKEND_URL` override is
    /// never written back.
    pub fn save_model_to(path: &Path, model_type: &str, model_name: &str) -> Result<()> {
        let mut config = Self::load_stored(path).unwrap_or_else(|_| Self::new());
        config.model_type = model_type.to_string();
        config.model_name = model_name.to_string();
        config.save_to(path)
    }

    /// Backend URL without a trailing slash, ready for joining endpoint paths.
    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ragchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = Config::new();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.model_type, "ollama");
        assert!(!config.use_rag);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.backend_url = "http://10.0.0.5:9000/".to_string();
        config.model_name = "llama3:8b".to_string();
        config.use_rag = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.base_url(), "http://10.0.0.5:9000");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model_name":"mistral"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model_name, "mistral");
        assert_eq!(loaded.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(loaded.model_type, "ollama");
    }

    #[test]
    fn test_save_model_keeps_stored_backend_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut stored = Config::new();
        stored.backend_url = "http://10.0.0.5:9000".to_string();
        stored.use_rag = true;
        stored.save_to(&path).unwrap();

        std::env::set_var(BACKEND_URL_ENV, "http://tmp-override:1");
        let result = Config::save_model_to(&path, "openai", "gpt-4o");
        std::env::remove_var(BACKEND_URL_ENV);
        result.unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.backend_url, "http://10.0.0.5:9000");
        assert_eq!(saved.model_type, "openai");
        assert_eq!(saved.model_name, "gpt-4o");
        assert!(saved.use_rag);

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("tmp-override"));
    }

    #[test]
    fn test_save_model_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ragchat").join("config.json");

        Config::save_model_to(&path, "ollama", "llama3:8b").unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(saved.model_name, "llama3:8b");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
