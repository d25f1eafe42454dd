use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ai: AiConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub user: String,
    pub password: String,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".predica")
            .join("config.yaml")
    }

    pub fn load_or_default() -> Self {
        let config_path = Self::get_config_path();

        // Try to load existing config
        if config_path.exists() {
            if let Ok(config) = Self::load_from_file(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::get_config_path())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(2048),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            user: std::env::var("EMAIL_USER").unwrap_or_default(),
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.ai.model = "gpt-4o".to_string();
        config.ai.api_url = "http://localhost:9999/v1".to_string();
        config.email.user = "preacher@example.org".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();

        assert_eq!(loaded.ai.model, "gpt-4o");
        assert_eq!(loaded.ai.api_url, "http://localhost:9999/v1");
        assert_eq!(loaded.email.user, "preacher@example.org");
        assert_eq!(loaded.email.smtp_server, "smtp.gmail.com");
    }

    #[test]
    #[serial]
    fn test_config_without_email_section_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "ai:\n  api_url: http://localhost/v1\n  api_key: k\n  model: gpt-4o-mini\n",
        )
        .unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.ai.model, "gpt-4o-mini");
        assert_eq!(loaded.email.smtp_server, "smtp.gmail.com");
    }
}
