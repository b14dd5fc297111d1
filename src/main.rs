mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "eloleague")]
#[command(about = "League, team and schedule service with Elo ratings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Overrides PORT from the environment
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Initialize the database
    InitDb,
    /// Insert a demo league with teams and fixtures
    Seed,
    /// Print teams ordered by rating
    Standings {
        #[arg(short, long)]
        league_id: Option<String>,
    },
    /// Record a match result and update ratings
    Record {
        #[arg(short, long)]
        schedule_id: String,
        #[arg(long)]
        home: u32,
        #[arg(long)]
        away: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                settings.port = port;
            }
            tracing::info!("Starting league API server on port {}", settings.port);
            api::serve(settings).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database(&settings.database_url).await?;
        }
        Some(Commands::Seed) => {
            cli::seed(&settings).await?;
        }
        Some(Commands::Standings { league_id }) => {
            cli::show_standings(&settings, league_id.as_deref()).await?;
        }
        Some(Commands::Record {
            schedule_id,
            home,
            away,
        }) => {
            tracing::info!("Recording result for schedule {}: {}-{}", schedule_id, home, away);
            cli::record_result(&settings, &schedule_id, home, away).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting league API server on port {}", settings.port);
            api::serve(settings).await?;
        }
    }

    Ok(())
}
