//! Login, logout and health commands.

use super::{print_json, Context};
use crate::core::facade::Backend;
use anyhow::{bail, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};

fn prompt_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Log in (or create the first administrator) and persist the session.
pub async fn login(
    ctx: &Context,
    username: &str,
    password: Option<String>,
    setup: bool,
    display_name: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let data = if setup {
        let Backend::BitHarbor(adapter) = ctx.client.backend() else {
            bail!("--setup is only available on the bitharbor backend");
        };
        let display_name = display_name.unwrap_or_else(|| {
            username.split('@').next().unwrap_or(username).to_string()
        });
        let user = adapter.setup(username, &password, &display_name).await?;
        let data = user.into_session(ctx.client.backend_kind());
        ctx.client.session().set(data.clone());
        data
    } else {
        ctx.client.login(username, &password).await?
    };

    ctx.store.save(&data)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "backend": data.backend,
            "userId": data.user_id,
            "userName": data.user_name,
        }));
    }

    println!(
        "{} Logged in to {} as {}",
        "[OK]".green(),
        ctx.client.backend_kind().to_string().bold(),
        data.user_name.bold()
    );
    println!("  Session saved to {}", ctx.store.path().display());
    Ok(())
}

/// Forget the session, locally and on disk.
pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.client.logout();
    ctx.store.remove()?;
    println!("{} Logged out", "[OK]".green());
    Ok(())
}

/// Check the backend health endpoint.
pub async fn health(ctx: &Context) -> Result<()> {
    let healthy = ctx.client.health_check().await;
    let kind = ctx.client.backend_kind();

    if ctx.json {
        print_json(&serde_json::json!({
            "backend": kind,
            "baseUrl": ctx.config.active_base_url(),
            "healthy": healthy,
        }))?;
    } else if healthy {
        println!(
            "{} {} backend at {} is reachable",
            "[OK]".green(),
            kind,
            ctx.config.active_base_url()
        );
    } else {
        println!(
            "{} {} backend at {} is not reachable",
            "[FAIL]".red(),
            kind,
            ctx.config.active_base_url()
        );
    }

    if !healthy {
        bail!("Backend health check failed");
    }
    Ok(())
}
