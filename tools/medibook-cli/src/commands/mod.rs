//! CLI command implementations.

pub mod authorize;
pub mod config;
pub mod fetch;
pub mod watch;

use clap::{Args, Subcommand};
use medibook_core::ClientConfig;
use medibook_data::{ApiClient, FetchResult, HttpTransport};
use serde_json::Value;

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Resource locator, relative to the configured base URL (e.g. /doctors).
    pub locator: String,

    /// Bearer token sent with the request.
    #[arg(short, long)]
    pub token: Option<String>,
}

/// Arguments for the authorize command.
#[derive(Args)]
pub struct AuthorizeArgs {
    /// Roles permitted to access the view (patient, doctor, admin).
    #[arg(short, long = "allow", required = true, num_args = 1..)]
    pub allow: Vec<String>,

    /// Role of the session being checked.
    #[arg(short, long, default_value = "")]
    pub role: String,

    /// Session token; omitted means signed out.
    #[arg(short, long)]
    pub token: Option<String>,

    /// Override the redirect destination for denied sessions.
    #[arg(long)]
    pub redirect_to: Option<String>,
}

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Bearer token sent with every request.
    #[arg(short, long)]
    pub token: Option<String>,

    /// Quiet period in milliseconds (default: search.debounce_ms).
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Print a default config file.
    Init,
}

/// Build an API client from the configuration.
pub(crate) fn api_client(config: &ClientConfig, token: Option<String>) -> ApiClient {
    ApiClient::from_config(&config.api, HttpTransport::new()).with_token(token)
}

/// Short status label for a fetch result.
pub(crate) fn status_label(result: &FetchResult<Value>) -> &'static str {
    if result.loading {
        "loading"
    } else if result.error.is_some() {
        "error"
    } else if result.data.is_some() {
        "ready"
    } else {
        "idle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibook_data::{FailureKind, FetchFailure};

    #[test]
    fn test_status_label() {
        let mut result = FetchResult::<Value>::default();
        assert_eq!(status_label(&result), "idle");

        result.loading = true;
        assert_eq!(status_label(&result), "loading");

        result.loading = false;
        result.data = Some(serde_json::json!([]));
        assert_eq!(status_label(&result), "ready");

        result.error = Some(FetchFailure {
            message: "Network error".to_string(),
            kind: FailureKind::Application,
            status: Some(500),
        });
        assert_eq!(status_label(&result), "error");
    }
}
