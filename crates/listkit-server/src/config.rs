use std::path::Path;
use std::time::Duration;

use listkit_core::AppConfig;
use listkit_services::{AirtableConfig, PollsConfig, SpearmintConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("{0} must be set when using the http backend")]
    MissingCredential(&'static str),
}

/// Where service calls go: the real HTTP APIs, or process-local stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Backend::Http),
            "memory" => Ok(Backend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: Backend,
    pub interactions: InteractionsConfig,
    pub airtable: AirtableSection,
    pub spearmint: SpearmintSection,
    pub polls: PollsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionsConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for InteractionsConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 900,
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AirtableSection {
    pub base_url: String,
    pub token: String,
    pub base_id: String,
    pub table: String,
}

impl Default for AirtableSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.airtable.com".into(),
            token: String::new(),
            base_id: String::new(),
            table: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpearmintSection {
    pub base_url: String,
    pub api_key: String,
}

impl Default for SpearmintSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.spearmint.xyz".into(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollsSection {
    pub base_url: String,
    pub api_key: String,
}

impl Default for PollsSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.pollsapi.com".into(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Read `path` (defaults when it does not exist) and apply environment
    /// overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
            Self::parse(path, &raw)?
        } else {
            tracing::info!("Config file {path} not found, using defaults");
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn parse(path: &str, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let set = |target: &mut String, name: &str| {
            if let Some(value) = var(name) {
                *target = value;
            }
        };
        set(&mut self.server.host, "HOST");
        set(&mut self.airtable.base_url, "LISTKIT_AIRTABLE_URL");
        set(&mut self.airtable.token, "LISTKIT_AIRTABLE_TOKEN");
        set(&mut self.airtable.base_id, "LISTKIT_AIRTABLE_BASE_ID");
        set(&mut self.airtable.table, "LISTKIT_AIRTABLE_TABLE");
        set(&mut self.spearmint.base_url, "LISTKIT_SPEARMINT_URL");
        set(&mut self.spearmint.api_key, "LISTKIT_SPEARMINT_API_KEY");
        set(&mut self.polls.base_url, "LISTKIT_POLLS_URL");
        set(&mut self.polls.api_key, "LISTKIT_POLLS_API_KEY");

        if let Some(value) = var("PORT") {
            self.server.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: value.clone(),
            })?;
        }
        if let Some(value) = var("LISTKIT_BACKEND") {
            self.backend = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "LISTKIT_BACKEND",
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            interaction_ttl: Duration::from_secs(self.interactions.ttl_seconds),
            interaction_log_capacity: self.interactions.max_entries,
        }
    }

    /// Every credential the http backend needs, or the first one missing.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        let required = [
            ("airtable.token", &self.airtable.token),
            ("airtable.base_id", &self.airtable.base_id),
            ("airtable.table", &self.airtable.table),
            ("spearmint.api_key", &self.spearmint.api_key),
            ("polls.api_key", &self.polls.api_key),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::MissingCredential(*name)),
            None => Ok(()),
        }
    }

    pub fn airtable(&self) -> AirtableConfig {
        AirtableConfig {
            base_url: self.airtable.base_url.clone(),
            token: self.airtable.token.clone(),
            base_id: self.airtable.base_id.clone(),
            table: self.airtable.table.clone(),
        }
    }

    pub fn spearmint(&self) -> SpearmintConfig {
        SpearmintConfig {
            base_url: self.spearmint.base_url.clone(),
            api_key: self.spearmint.api_key.clone(),
        }
    }

    pub fn polls(&self) -> PollsConfig {
        PollsConfig {
            base_url: self.polls.base_url.clone(),
            api_key: self.polls.api_key.clone(),
        }
    }
}
