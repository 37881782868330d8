use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_BASE_PATH;
use crate::error::{ChannelFinderError, Result};

const CONFIG_FILE: &str = "config.toml";

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# channelfinder configuration file
# Location: ~/.channelfinder/config.toml

[server]
# Origin of the ChannelFinder service
# Default: "http://localhost:8080"
url = "http://localhost:8080"

# Path the service is deployed under
# Default: "/ChannelFinder"
path = "/ChannelFinder"

[client]
# Owner recorded on tags, properties and channels you create or apply
# Example: owner = "cf-update"
owner = ""
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Where the service lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_path")]
    pub path: String,
}

fn default_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            path: default_path(),
        }
    }
}

/// Per-user defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub owner: String,
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ChannelFinderError::ConfigParse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Full service base URL: origin plus deployment path
    pub fn base_url(&self) -> String {
        let origin = self.server.url.trim_end_matches('/');
        let path = self.server.path.trim_matches('/');
        if path.is_empty() {
            origin.to_string()
        } else {
            format!("{}/{}", origin, path)
        }
    }

    /// Owner, if one is configured
    pub fn owner(&self) -> Option<&str> {
        Some(self.client.owner.as_str()).filter(|o| !o.is_empty())
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "server.url" => Some(self.server.url.clone()),
            "server.path" => Some(self.server.path.clone()),
            "client.owner" => Some(self.client.owner.clone()),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim().trim_matches('"').to_string();
        match key {
            "server.url" => self.server.url = value,
            "server.path" => self.server.path = value,
            "client.owner" => self.client.owner = value,
            _ => {
                return Err(ChannelFinderError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        ["server.url", "server.path", "client.owner"]
            .iter()
            .filter_map(|key| self.get(key).map(|v| (key.to_string(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_base_url() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://localhost:8080/ChannelFinder");
        assert_eq!(config.owner(), None);
    }

    #[test]
    fn test_base_url_joins_slashes() {
        let mut config = Config::default();
        config.set("server.url", "https://cf.site.org/").unwrap();
        config.set("server.path", "ChannelFinder/").unwrap();
        assert_eq!(config.base_url(), "https://cf.site.org/ChannelFinder");

        config.set("server.path", "").unwrap();
        assert_eq!(config.base_url(), "https://cf.site.org");
    }

    #[test]
    fn test_set_unknown_key() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("server.port", "80"),
            Err(ChannelFinderError::ConfigKeyNotFound { .. })
        ));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.set("client.owner", "\"cf-update\"").unwrap();
        config.save(tmp.path()).unwrap();

        let loaded = Config::load(tmp.path()).unwrap();
        assert_eq!(loaded.owner(), Some("cf-update"));
        assert_eq!(loaded.list().len(), 3);
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = Config::init(tmp.path()).unwrap();
        fs::write(&path, "[client]\nowner = \"kept\"\n").unwrap();

        Config::init(tmp.path()).unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap().owner(), Some("kept"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let tmp = TempDir::new().unwrap();
        fs::write(Config::path(tmp.path()), "[server\nurl = ").unwrap();
        let err = Config::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ChannelFinderError::ConfigParse { .. }));
    }
}
