//! Anime Resolver CLI
//!
//! A command-line tool for resolving catalogue files into shows, seasons and episodes.

use anime_resolver::cli::{
    args::{Cli, Commands},
    commands::{config, path, season, show, tags},
};
use anime_resolver::models::config::{load_config, Config};
use anime_resolver::preflight;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let app_config = load_config()?;

    // Run preflight checks unless skipped
    if cli.command.needs_server() && !cli.skip_preflight {
        run_preflight_checks(&app_config).await?;
    }

    // Run the appropriate command
    match cli.command {
        Commands::Path { path, json } => {
            path::resolve_path(app_config, &path, json).await?;
        }

        Commands::Season { id, json } => {
            season::show_season(app_config, &id, json).await?;
        }

        Commands::Show { season_id, json } => {
            show::show_show(app_config, &season_id, json).await?;
        }

        Commands::Tags { series_id } => {
            tags::show_tags(app_config, series_id).await?;
        }

        Commands::Config => {
            config::print_config(&app_config)?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("anime_resolver=debug")
    } else {
        EnvFilter::new("anime_resolver=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
async fn run_preflight_checks(config: &Config) -> anyhow::Result<()> {
    use colored::Colorize;

    println!("{}", "Running preflight checks...".bold());
    println!();

    let report = preflight::PreflightReport::run(config).await;
    report.print();

    println!();

    if !report.passed() {
        anyhow::bail!(
            "{} preflight check(s) failed. Fix the issues above and try again.",
            report.failures()
        );
    }

    Ok(())
}
