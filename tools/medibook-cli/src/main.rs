//! MediBook CLI - exercise the booking API from the terminal.
//!
//! Commands:
//! - `medibook fetch` - Fetch a resource and print its fetch state
//! - `medibook authorize` - Evaluate a session against a role guard
//! - `medibook watch` - Follow locators read from stdin, debounced
//! - `medibook config` - Print the effective or default configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medibook_core::LogFormat;

use commands::{AuthorizeArgs, ConfigArgs, FetchArgs, WatchArgs};

/// MediBook CLI - Query the booking API and check access rules
#[derive(Parser)]
#[command(name = "medibook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log format (json or human), overriding the config file
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a resource and print the resulting state
    Fetch(FetchArgs),

    /// Check whether a session may access a protected view
    Authorize(AuthorizeArgs),

    /// Read locators from stdin and follow them
    Watch(WatchArgs),

    /// Show configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = ctx.init_logging(cli.verbose, cli.log_format) {
        ctx.output.warn(&format!("{:#}", e));
    }

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Authorize(args) => commands::authorize::run(args, &ctx).await,
        Commands::Watch(args) => commands::watch::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
