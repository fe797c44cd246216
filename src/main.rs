//! polyapi CLI - terminal menu over public REST APIs

use anyhow::Context;
use clap::Parser;
use polyapi::api::{AlphaVantageClient, ApiClient, CensusGeocoder, NoaaClient};
use polyapi::config::{self, Settings};
use polyapi::menu::{Menu, Services};
use polyapi::storage::ReferenceStore;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "polyapi")]
#[command(version)]
#[command(about = "Weather, geocoding and stock quotes from public APIs, with a local cache")]
#[command(long_about = r#"
polyapi is a numbered terminal menu over public REST APIs:
  • Geocode an address (US Census) and show NOAA weather for it
  • Look up a stock quote and company overview (Alpha Vantage)
  • Reuse or delete previously looked-up addresses and tickers

Set ALPHAVANTAGE_API_KEY for stock lookups.
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the database file (default: ./db/polyapi.db)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to the config file (default: ./polyapi.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps it out of the menu output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.database, file_config);

    let store = ReferenceStore::open(&settings.database)
        .with_context(|| format!("cannot open database {}", settings.database.display()))?;
    tracing::info!("Using database {}", settings.database.display());

    let client = ApiClient::new(&settings.user_agent, settings.timeout)?;
    let geocoder = CensusGeocoder::new(client.clone());
    let weather = NoaaClient::new(client.clone());
    let quotes = AlphaVantageClient::new(client);

    let services = Services {
        geocoder: &geocoder,
        weather: &weather,
        quotes: &quotes,
    };

    let stdin = std::io::stdin();
    Menu::new(&store, services, stdin.lock()).run()?;

    Ok(())
}
