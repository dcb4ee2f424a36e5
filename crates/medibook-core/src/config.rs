//! Client configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{LogFormat, LoggingConfig};

/// File names searched for by [`ClientConfig::discover`], in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["medibook.toml", ".medibook.toml", "medibook.json"];

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "MEDIBOOK_BASE_URL";

/// Environment variable that overrides `logging.format`.
pub const LOG_FORMAT_ENV: &str = "MEDIBOOK_LOG_FORMAT";

/// Client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Access guard settings.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Search input settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Find and load the nearest config file, walking up from `start`.
    /// Yields the path that was loaded alongside the config.
    ///
    /// Returns `Ok(None)` when no config file exists anywhere up the tree.
    /// A config file that exists but fails to parse is an error.
    pub fn discover(start: impl AsRef<Path>) -> Result<Option<(PathBuf, Self)>> {
        let mut current: PathBuf = start.as_ref().to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    tracing::debug!(path = %candidate.display(), "loading config");
                    let config = Self::load(&candidate)?;
                    return Ok(Some((candidate, config)));
                }
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = base_url;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            match format.parse::<LogFormat>() {
                Ok(format) => self.logging.format = format,
                Err(e) => tracing::warn!(error = %e, "ignoring {}", LOG_FORMAT_ENV),
            }
        }
        self
    }
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL that relative locators are joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Access guard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Destination for denied navigation.
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
}

fn default_redirect_to() -> String {
    "/login".to_string()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            redirect_to: default_redirect_to(),
        }
    }
}

/// Search input settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a changed search locator is fetched.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    700
}

impl SearchConfig {
    /// Debounce window as a `Duration`.
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Generate a default medibook.toml config file.
pub fn generate_default_config() -> String {
    r#"# MediBook client configuration

[api]
base_url = "http://localhost:5000/api/v1"

[guard]
redirect_to = "/login"

[search]
debounce_ms = 700

[logging]
format = "human"
filter = "medibook=info"
"#
    .to_string()
}
