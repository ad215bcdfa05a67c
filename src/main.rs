use anyhow::{Context, Result};
use charitymap_client::{ApiClient, FixedLocationProvider, SearchColumn};
use charitymap_core::config::{AppConfig, LogFormat, LoggingConfig};
use charitymap_core::credentials::StoredCredentials;
use charitymap_core::types::{Coordinate, Project};
use charitymap_filter::Legend;
use charitymap_map::CharityMap;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// CharityMap - project map and Near-Me search over the CharityMap backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Bearer token, overriding the stored credentials
    #[arg(long, env = "CHARITYMAP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every project and print legend counts
    List,

    /// Search projects and print the matching markers
    Search {
        query: String,

        /// Column to search (all, name, category, status, county, ...)
        #[arg(long, default_value_t = SearchColumn::All)]
        column: SearchColumn,
    },

    /// Find projects near a location, nearest first
    NearMe {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Search radius in kilometers
        #[arg(long)]
        radius: Option<f64>,
    },
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        logging.parse_level()?
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::from_config_builder(path)
        .with_context(|| format!("Failed to load config: {:?}", path))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_client(config: &AppConfig, token: Option<String>) -> Result<ApiClient> {
    let client = ApiClient::new(&config.api).context("Failed to create API client")?;

    if let Some(token) = token {
        return Ok(client.with_token(token));
    }

    let credentials = match &config.api.credentials_path {
        Some(path) => StoredCredentials::load(path)
            .with_context(|| format!("Failed to read credentials: {:?}", path))?,
        None => StoredCredentials::default(),
    };
    if let Some(user) = credentials.user_name() {
        info!(user = %user, "Using stored credentials");
    }

    Ok(client.with_credentials(&credentials))
}

fn print_legend(legend: &Legend, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(legend)?);
        return Ok(());
    }

    println!("Showing {} ({} markers)", legend.source, legend.visible_markers);
    println!("  Status:");
    for entry in &legend.statuses {
        println!(
            "    [{}] {:<12} {:>5} / {:<5}",
            if entry.enabled { "x" } else { " " },
            entry.key.label(),
            entry.visible,
            entry.total
        );
    }
    println!("  Category:");
    for entry in &legend.categories {
        println!(
            "    [{}] {:<12} {:>5} / {:<5}",
            if entry.enabled { "x" } else { " " },
            entry.key.label(),
            entry.visible,
            entry.total
        );
    }
    if let Some(near_me) = &legend.near_me {
        println!("  Near me: {} within {} km", near_me.count, near_me.radius_km);
    }
    Ok(())
}

fn print_projects(projects: &[Project], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(projects)?);
        return Ok(());
    }

    for project in projects {
        let position = project
            .position()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "no position".to_string());
        match project.distance {
            Some(km) => println!(
                "{:>8.2} km  #{:<6} {} [{}] ({})",
                km,
                project.id,
                project.name,
                project.status.label(),
                position
            ),
            None => println!(
                "#{:<6} {} [{}] ({})",
                project.id,
                project.name,
                project.status.label(),
                position
            ),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration file
    let mut config = load_config(&args.config)?;
    init_tracing(&config.logging, args.verbose)?;
    info!("Configuration loaded from {:?}", args.config);

    if let Command::NearMe {
        lat: Some(lat),
        lon: Some(lon),
        ..
    } = &args.command
    {
        config.geolocation.fixed_position = Some(Coordinate::new(*lat, *lon));
    }

    let client = build_client(&config, args.token.clone())?;
    let locator = FixedLocationProvider::new(config.geolocation.fixed_position);

    let mut map = CharityMap::new(&config, Arc::new(client), Arc::new(locator));
    map.mount();

    let loaded = map.load_projects().await;
    if let Some(e) = map.list_error() {
        warn!(error = %e, "Project list unavailable");
    }
    info!(projects = loaded, "Projects loaded");

    match args.command {
        Command::List => {
            print_legend(&map.legend(), args.json)?;
        }
        Command::Search { query, column } => {
            if map.set_search_query(query.as_str(), column).is_none() {
                anyhow::bail!("Search query must not be blank");
            }
            map.next_search_outcome().await;

            if let Some(e) = map.search_error() {
                anyhow::bail!("Search failed: {}", e);
            }
            print_projects(map.search_results(), args.json)?;

            if !args.json {
                if let Ok(viewport) = map.surface().viewport() {
                    println!(
                        "Viewport: center {} zoom {:.2}",
                        viewport.center, viewport.zoom
                    );
                }
            }
        }
        Command::NearMe { radius, .. } => {
            if let Some(radius) = radius {
                map.set_radius(radius);
            }
            if !map.find_near_me().await {
                let message = map
                    .location_error()
                    .map(|e| e.user_message())
                    .unwrap_or_else(|| "Unable to determine location".to_string());
                anyhow::bail!("{} (pass --lat and --lon)", message);
            }

            if !args.json {
                println!(
                    "{} projects within {} km",
                    map.near_me().results().len(),
                    map.near_me().radius_km()
                );
            }
            print_projects(map.near_me().results(), args.json)?;
        }
    }

    map.unmount();
    Ok(())
}
