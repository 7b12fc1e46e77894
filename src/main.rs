//! Harbor CLI
//!
//! Browse, search and manage a personal media server from the terminal.

use clap::Parser;
use harbor_client::cli::{
    args::{CatalogAction, Cli, Commands},
    commands::{account, browse, catalog, ingest, playback, search, Context},
};
use harbor_client::preflight;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let ctx = Context::load(cli.config.as_deref(), cli.json)?;

    // Run preflight checks unless skipped
    if cli.needs_preflight() && !cli.skip_preflight {
        run_preflight_checks(&ctx).await?;
    }

    // Run the appropriate command
    match cli.command {
        Commands::Login {
            username,
            password,
            setup,
            display_name,
        } => {
            account::login(&ctx, &username, password, setup, display_name).await?;
        }

        Commands::Logout => {
            account::logout(&ctx).await?;
        }

        Commands::Health => {
            account::health(&ctx).await?;
        }

        Commands::Libraries => {
            browse::libraries(&ctx).await?;
        }

        Commands::Items {
            library_id,
            media_type,
            limit,
            offset,
            sort,
            desc,
            genre,
        } => {
            browse::items(&ctx, library_id, media_type, limit, offset, sort, desc, genre).await?;
        }

        Commands::Show {
            item_id,
            media_type,
        } => {
            browse::show(&ctx, &item_id, media_type).await?;
        }

        Commands::Home { limit } => {
            browse::home(&ctx, limit).await?;
        }

        Commands::Favorite { item_id, remove } => {
            playback::favorite(&ctx, &item_id, remove).await?;
        }

        Commands::Played { item_id } => {
            playback::played(&ctx, &item_id).await?;
        }

        Commands::Progress {
            item_id,
            seconds,
            paused,
            stopped,
        } => {
            playback::progress(&ctx, &item_id, seconds, paused, stopped).await?;
        }

        Commands::Search {
            query,
            media_type,
            limit,
            local,
            min_score,
        } => {
            search::execute_search(&ctx, &query, media_type, limit, local, min_score).await?;
        }

        Commands::Catalog { action } => match action {
            CatalogAction::Search {
                query,
                year,
                limit,
                media_type,
            } => {
                catalog::search(&ctx, &query, year.as_deref(), limit, media_type).await?;
            }
            CatalogAction::Ingest {
                query,
                year,
                limit,
                media_type,
                pick,
                all,
                plan,
            } => {
                catalog::ingest(
                    &ctx,
                    &query,
                    year.as_deref(),
                    limit,
                    media_type,
                    &pick,
                    all,
                    plan,
                )
                .await?;
            }
            CatalogAction::Download {
                match_key,
                media_type,
                plan,
            } => {
                catalog::download(&ctx, &match_key, media_type, plan).await?;
            }
        },

        Commands::Ingest {
            path,
            media_type,
            source,
            metadata,
            poster,
        } => {
            ingest::ingest(
                &ctx,
                &path,
                media_type,
                source,
                metadata.as_deref(),
                poster.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("harbor_client=debug")
    } else {
        EnvFilter::new("harbor_client=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
async fn run_preflight_checks(ctx: &Context) -> anyhow::Result<()> {
    use colored::Colorize;

    if !ctx.json {
        println!("{}", "Running preflight checks...".bold());
        println!();
    }

    let results = preflight::run_preflight_checks(&ctx.client).await;
    if !ctx.json || !preflight::all_passed(&results) {
        preflight::print_results(&results);
        println!();
    }

    if !preflight::all_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
