//! nekokai — search the cached AniList/Kitsu lookup from the command line.
//!
//! Runs the same orchestrators the bot uses and prints results as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use nekokai::{Config, Domain, MediaSource, Nekokai, Provider, SearchOrchestrator, Secrets};

/// Nekokai lookup CLI
#[derive(Parser)]
#[command(name = "nekokai")]
#[command(version)]
#[command(about = "Search AniList and Kitsu through the nekokai cache")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream provider: anilist or kitsu.
    #[arg(short, long, default_value = "anilist")]
    provider: Provider,

    /// Media kind: anime or manga.
    #[arg(short, long, default_value = "anime")]
    domain: Domain,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List entries for a query (blank for trending)
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Resolve one entry from a selection key, title or query
    Get { identifier: String },

    /// Show the choices autocomplete would offer
    Autocomplete {
        #[arg(default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let nekokai = Nekokai::from_config(&config, &secrets).await?;

    info!(provider = %args.provider, domain = %args.domain, "running command");

    let output = match args.provider {
        Provider::AniList => run(nekokai.anilist(), args.domain, args.command).await?,
        Provider::Kitsu => run(nekokai.kitsu()?, args.domain, args.command).await?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run<S: MediaSource>(
    orchestrator: &SearchOrchestrator<S>,
    domain: Domain,
    command: Command,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    match command {
        Command::Search { query } => to_json(&orchestrator.try_search(domain, &query).await?),
        Command::Get { identifier } => {
            to_json(&orchestrator.try_get_single(domain, &identifier).await?)
        }
        Command::Autocomplete { query } => {
            to_json(&orchestrator.try_autocomplete(domain, &query).await?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(value)?)
}
