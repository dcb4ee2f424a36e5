//! Fetch a single resource.

use anyhow::{bail, Result};
use medibook_data::FetchState;
use serde_json::Value;

use super::{api_client, status_label, FetchArgs};
use crate::context::Context;
use crate::output::status_badge;

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let client = api_client(&ctx.config, args.token);
    let url = client.resolve_url(&args.locator);
    ctx.output.debug(&format!("GET {}", url));

    let state: FetchState<Value> = FetchState::new(client);
    if let Some(task) = state.observe(args.locator.as_str()) {
        task.run().await;
    }
    let result = state.snapshot();

    if ctx.output.is_json() {
        ctx.output.json(&result);
    } else {
        ctx.output.header(&args.locator);
        ctx.output.kv("url", &url);
        ctx.output.kv("status", &status_badge(status_label(&result)));
        if let Some(ref data) = result.data {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }

    if let Some(message) = result.error_message() {
        bail!("{}", message);
    }
    Ok(())
}
