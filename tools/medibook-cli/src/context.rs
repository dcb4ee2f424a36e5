//! CLI execution context.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use medibook_core::{init_logging, ClientConfig, LogFormat};

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Effective client configuration.
    pub config: ClientConfig,
    /// Output handler.
    pub output: Output,
    /// Where the configuration came from, if a file was used.
    pub config_path: Option<PathBuf>,
}

impl Context {
    /// Load context from an explicit config file, or the nearest one found
    /// walking up from the working directory.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let (config, config_path) = match config_path {
            Some(path) => (ClientConfig::load(path)?, Some(PathBuf::from(path))),
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                match ClientConfig::discover(&cwd)? {
                    Some((path, config)) => (config, Some(path)),
                    None => (ClientConfig::default(), None),
                }
            }
        };

        Ok(Self {
            config: config.with_env_overrides(),
            output,
            config_path,
        })
    }

    /// Install the tracing subscriber. `verbose` raises the default filter
    /// to debug; `RUST_LOG` still wins when set.
    pub fn init_logging(&self, verbose: bool, format: Option<LogFormat>) -> Result<()> {
        let mut logging = self.config.logging.clone();
        if let Some(format) = format {
            logging.format = format;
        }
        if verbose {
            logging.filter = "medibook=debug".to_string();
        }
        init_logging(&logging)
    }
}
