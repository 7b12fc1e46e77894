//! Favorite, played and playback progress commands.

use super::{print_json, Context};
use anyhow::{bail, Result};
use colored::Colorize;

fn report(ctx: &Context, ok: bool, action: &str, item_id: &str) -> Result<()> {
    if ctx.json {
        print_json(&serde_json::json!({ "itemId": item_id, "ok": ok }))?;
    } else if ok {
        println!("{} {} {}", "[OK]".green(), action, item_id);
    } else {
        println!("{} {} {}", "[FAIL]".red(), action, item_id);
    }

    if !ok {
        bail!(
            "{} failed (the {} backend may not support it)",
            action,
            ctx.client.backend_kind()
        );
    }
    Ok(())
}

/// Add or remove a favorite.
pub async fn favorite(ctx: &Context, item_id: &str, remove: bool) -> Result<()> {
    // The toggle takes the current state: "currently favorite" removes.
    let ok = ctx.client.toggle_favorite(item_id, remove).await;
    let action = if remove {
        "Removed favorite"
    } else {
        "Added favorite"
    };
    report(ctx, ok, action, item_id)
}

/// Mark an item as played.
pub async fn played(ctx: &Context, item_id: &str) -> Result<()> {
    let ok = ctx.client.mark_as_played(item_id).await;
    report(ctx, ok, "Marked as played", item_id)
}

/// Report a playback position.
pub async fn progress(
    ctx: &Context,
    item_id: &str,
    seconds: u64,
    paused: bool,
    stopped: bool,
) -> Result<()> {
    let ok = if stopped {
        ctx.client.report_playback_stopped(item_id, seconds).await
    } else {
        ctx.client
            .report_playback_progress(item_id, seconds, paused)
            .await
    };
    report(ctx, ok, &format!("Reported {} s for", seconds), item_id)
}
