//! Configuration commands.

use anyhow::Result;
use medibook_core::generate_default_config;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init => {
            print!("{}", generate_default_config());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &ctx.config.api.base_url);

    ctx.output.info("[guard]");
    ctx.output.kv("redirect_to", &ctx.config.guard.redirect_to);

    ctx.output.info("[search]");
    ctx.output.kv("debounce_ms", &ctx.config.search.debounce_ms.to_string());

    ctx.output.info("[logging]");
    ctx.output.kv("format", &ctx.config.logging.format.to_string());
    ctx.output.kv("filter", &ctx.config.logging.filter);
    Ok(())
}
