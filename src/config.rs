//! TOML configuration.
//!
//! Every section has defaults, so an absent config file is valid and yields
//! [`Config::default`]. Environment variables are applied on top of the
//! file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `PORT` | `server.port` |
//! | `CORPUS_DB_PATH` | `db.path` |
//! | `CORPUS_SERVER_URL` | `client.base_url` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/corpora.sqlite")
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3001
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

/// Load the config file at `path`, falling back to defaults if it does not
/// exist, then apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Apply environment overrides. `lookup` is injected so tests do not touch
/// the process environment.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(port) = lookup("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got '{}'", port))?;
    }
    if let Some(path) = lookup("CORPUS_DB_PATH") {
        config.db.path = PathBuf::from(path);
    }
    if let Some(url) = lookup("CORPUS_SERVER_URL") {
        config.client.base_url = url;
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("server.port must be > 0");
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }
    let url = &config.client.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!(
            "client.base_url must start with http:// or https://, got '{}'",
            url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:3001");
        assert_eq!(config.db.max_connections, 5);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.db.path, PathBuf::from("./data/corpora.sqlite"));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corpus.toml");
        std::fs::write(&path, "[db]\npath = \"./x.sqlite\"\nmax_connections = 2\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.db.max_connections, 2);
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corpus.toml");
        std::fs::write(&path, "[db\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "4000"),
            ("CORPUS_DB_PATH", "/tmp/x.sqlite"),
            ("CORPUS_SERVER_URL", "http://example.test:4000"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.db.path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(config.client.base_url, "http://example.test:4000");
    }

    #[test]
    fn test_bad_port_env_rejected() {
        let mut config = Config::default();
        let result = apply_env_overrides(&mut config, |k| (k == "PORT").then(|| "abc".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.client.base_url = "localhost:3001".to_string();
        assert!(validate(&config).is_err());
    }
}
