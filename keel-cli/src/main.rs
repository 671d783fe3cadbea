//! keel CLI
//!
//! Runs the configuration API and administers its database.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keel_api::{ApiConfig, ApiServer};
use keel_core::traits::ConfigStore;
use keel_store::SqlStore;

/// keel - per-company configuration service
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
        /// libSQL URL or file path (in-memory store when omitted)
        #[arg(long, env = "KEEL_DATABASE_URL")]
        database_url: Option<String>,
        /// Redis URL for a cache shared between servers (in-process when omitted)
        #[arg(long, env = "KEEL_REDIS_URL")]
        redis_url: Option<String>,
    },

    /// Provision the database schema
    Migrate {
        /// libSQL URL or file path
        #[arg(long, env = "KEEL_DATABASE_URL")]
        database_url: String,
        /// Auth token for remote databases
        #[arg(long, env = "KEEL_DATABASE_TOKEN")]
        token: Option<String>,
    },

    /// Print a company's stored configuration
    Show {
        /// Company identifier
        company_id: String,
        /// libSQL URL or file path
        #[arg(long, env = "KEEL_DATABASE_URL")]
        database_url: String,
        /// Auth token for remote databases
        #[arg(long, env = "KEEL_DATABASE_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Serve { port, bind, database_url, redis_url } => {
            cmd_serve(port, &bind, database_url, redis_url).await
        }
        Commands::Migrate { database_url, token } => cmd_migrate(&database_url, token).await,
        Commands::Show { company_id, database_url, token } => {
            cmd_show(&company_id, &database_url, token).await
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "keel=debug,info"
    } else {
        "keel=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Run the API server
async fn cmd_serve(
    port: u16,
    bind: &str,
    database_url: Option<String>,
    redis_url: Option<String>,
) -> Result<()> {
    let addr = listen_addr(bind, port)?;

    let mut config = ApiConfig::from_env();
    if database_url.is_some() {
        config.database_url = database_url;
    }
    if redis_url.is_some() {
        config.redis_url = redis_url;
    }

    let store_label = match &config.database_url {
        Some(url) => url.clone(),
        None => "in-memory (not durable)".into(),
    };
    let cache_label = if config.redis_url.is_some() {
        "redis (shared)"
    } else {
        "in-process"
    };

    let server = ApiServer::from_config(config)
        .await
        .context("Failed to open the configuration store or cache")?;

    println!("{}", "Starting keel API server...".cyan().bold());
    println!("   {} {}", "Store:".green(), store_label);
    println!("   {} {}", "Cache:".green(), cache_label);
    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    server.run(addr).await?;

    Ok(())
}

/// Socket address for `bind`, which may be IPv4 or IPv6.
fn listen_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = bind
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .with_context(|| format!("Invalid bind address {bind}"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Provision the database schema
async fn cmd_migrate(database_url: &str, token: Option<String>) -> Result<()> {
    let store = SqlStore::connect(database_url, token)
        .await
        .with_context(|| format!("Failed to connect to {database_url}"))?;
    store.migrate().await.context("Schema provisioning failed")?;

    println!("{} {}", "✓ Schema ready at".green().bold(), database_url);
    Ok(())
}

/// Print a company's stored configuration
async fn cmd_show(company_id: &str, database_url: &str, token: Option<String>) -> Result<()> {
    let store = SqlStore::connect(database_url, token)
        .await
        .with_context(|| format!("Failed to connect to {database_url}"))?;

    let config = store
        .load_company(company_id)
        .await
        .with_context(|| format!("Failed to load configuration for {company_id}"))?;

    if config.hubspot_fields.is_empty() && config.upso_cadences.is_empty() {
        println!("{} {}", "No configuration stored for".yellow(), company_id);
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
