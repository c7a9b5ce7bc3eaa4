use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub messenger: MessengerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    pub app_secret: Option<String>,
    pub validation_token: Option<String>,
    pub page_access_token: Option<String>,
    pub graph_api_url: String,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            app_secret: None,
            validation_token: None,
            page_access_token: None,
            graph_api_url: grubot_messenger::DEFAULT_GRAPH_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/grubot.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

/// Secrets and endpoints every deployment must provide.
#[derive(Debug, Clone)]
pub struct Required {
    pub app_secret: String,
    pub validation_token: String,
    pub page_access_token: String,
    pub server_url: String,
}

impl Config {
    /// Load `path` (optional; defaults apply when absent) and apply
    /// environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    pub fn load_with_env(
        path: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
            toml::from_str(&raw)?
        } else {
            tracing::warn!(path, "config file not found, using defaults");
            Config::default()
        };
        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let set = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = set("MESSENGER_APP_SECRET") {
            self.messenger.app_secret = Some(v);
        }
        if let Some(v) = set("MESSENGER_VALIDATION_TOKEN") {
            self.messenger.validation_token = Some(v);
        }
        if let Some(v) = set("MESSENGER_PAGE_ACCESS_TOKEN") {
            self.messenger.page_access_token = Some(v);
        }
        if let Some(v) = set("SERVER_URL") {
            self.server.public_url = Some(v);
        }
        if let Some(v) = set("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = set("PORT") {
            let port: u16 = v.trim().parse().map_err(|_| ConfigError::InvalidPort(v.clone()))?;
            let host = self
                .server
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            self.server.bind_address = format!("{host}:{port}");
        }
        Ok(())
    }

    /// The values the bot cannot run without, or every key that is absent.
    pub fn required(&self) -> Result<Required, ConfigError> {
        fn present(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.trim().is_empty())
        }

        let app_secret = present(&self.messenger.app_secret);
        let validation_token = present(&self.messenger.validation_token);
        let page_access_token = present(&self.messenger.page_access_token);
        let server_url = present(&self.server.public_url);

        match (app_secret, validation_token, page_access_token, server_url) {
            (Some(app_secret), Some(validation_token), Some(page_access_token), Some(server_url)) => {
                Ok(Required {
                    app_secret,
                    validation_token,
                    page_access_token,
                    server_url,
                })
            }
            (a, v, p, s) => {
                let missing = [
                    (a.is_none(), "MESSENGER_APP_SECRET"),
                    (v.is_none(), "MESSENGER_VALIDATION_TOKEN"),
                    (p.is_none(), "MESSENGER_PAGE_ACCESS_TOKEN"),
                    (s.is_none(), "SERVER_URL"),
                ]
                .into_iter()
                .filter_map(|(absent, key)| absent.then_some(key))
                .collect();
                Err(ConfigError::Missing(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_values_are_loaded() {
        let file = write_config(
            r#"
[server]
bind_address = "127.0.0.1:8080"
public_url = "https://bot.example.com"

[messenger]
app_secret = "secret"
validation_token = "token"
page_access_token = "page"

[database]
url = "sqlite::memory:"
max_connections = 2

[logging]
json = true
"#,
        );
        let config = Config::load_with_env(file.path().to_str().unwrap(), env(&[])).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.database.max_connections, 2);
        assert!(config.logging.json);
        assert_eq!(
            config.messenger.graph_api_url,
            grubot_messenger::DEFAULT_GRAPH_API_URL
        );
        let required = config.required().unwrap();
        assert_eq!(required.server_url, "https://bot.example.com");
    }

    #[test]
    fn environment_overrides_the_file() {
        let file = write_config("[messenger]\napp_secret = \"from-file\"\n");
        let config = Config::load_with_env(
            file.path().to_str().unwrap(),
            env(&[
                ("MESSENGER_APP_SECRET", "from-env"),
                ("MESSENGER_VALIDATION_TOKEN", "token"),
                ("MESSENGER_PAGE_ACCESS_TOKEN", "page"),
                ("SERVER_URL", "https://bot.example.com"),
                ("PORT", "7000"),
            ]),
        )
        .unwrap();
        assert_eq!(config.messenger.app_secret.as_deref(), Some("from-env"));
        assert_eq!(config.server.bind_address, "0.0.0.0:7000");
        assert!(config.required().is_ok());
    }

    #[test]
    fn missing_secrets_are_listed() {
        let config = Config::load_with_env(
            "/nonexistent/grubot.toml",
            env(&[("MESSENGER_VALIDATION_TOKEN", "token")]),
        )
        .unwrap();
        match config.required() {
            Err(ConfigError::Missing(keys)) => assert_eq!(
                keys,
                ["MESSENGER_APP_SECRET", "MESSENGER_PAGE_ACCESS_TOKEN", "SERVER_URL"]
            ),
            other => panic!("expected missing keys, got {other:?}"),
        }
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::load_with_env("/nonexistent/grubot.toml", env(&[("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("[server\nbind_address = 1");
        let err = Config::load_with_env(file.path().to_str().unwrap(), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
