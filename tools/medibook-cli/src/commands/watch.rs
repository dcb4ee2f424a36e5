//! Follow a stream of locators read from stdin.
//!
//! Each line is a locator. Lines arriving in quick succession collapse
//! into the last one; only the latest locator's result is ever shown.

use anyhow::{Context as _, Result};
use medibook_data::{debounce, follow, FetchState};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use super::{api_client, status_label, WatchArgs};
use crate::context::Context;
use crate::output::status_badge;

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let Some(first) = lines.next_line().await.context("Failed to read stdin")? else {
        ctx.output.info("No locators on stdin");
        return Ok(());
    };

    let quiet = args
        .debounce_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| ctx.config.search.debounce());
    ctx.output.debug(&format!("debouncing locators by {:?}", quiet));

    let (tx, rx) = watch::channel(first.trim().to_string());
    let reader = tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });

    let state: FetchState<Value> = FetchState::new(api_client(&ctx.config, args.token));
    let mut results = state.subscribe();
    let driver = tokio::spawn(follow(state, debounce(rx, quiet)));

    while let Some(result) = results.changed().await {
        let locator = results.locator().unwrap_or_default();
        if ctx.output.is_json() {
            println!(
                "{}",
                serde_json::json!({ "locator": locator, "result": result })
            );
            continue;
        }

        let status = status_label(&result);
        match result.error_message() {
            Some(message) => ctx.output.kv(&locator, &format!("{} {}", status_badge(status), message)),
            None => ctx.output.kv(&locator, &status_badge(status)),
        }
        if result.is_ready() {
            if let Some(data) = result.data {
                println!("{}", data);
            }
        }
    }

    reader.await.context("stdin reader panicked")?;
    let started = driver.await.context("fetch driver panicked")?;
    ctx.output.success(&format!("{} request(s) issued", started));
    Ok(())
}
