//! WolfMedia - Media Storage Gateway
//!
//! Serves upload, list, create-folder and delete over HTTP in front of an
//! S3-compatible bucket.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wolfmedia::api::HttpServer;
use wolfmedia::config::{StorageBackend, WolfMediaConfig};
use wolfmedia::error::Result;
use wolfmedia::media::{ALLOWED_TYPES, LIST_LIMIT, MAX_FILE_SIZE};
use wolfmedia::storage;

/// WolfMedia - Media Storage Gateway
#[derive(Parser)]
#[command(name = "wolfmedia")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wolfmedia.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Serve,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "wolfmedia.toml")]
        output: PathBuf,

        /// Bucket name
        #[arg(long, default_value = "media")]
        bucket: String,
    },

    /// Validate configuration file
    Validate,

    /// Show gateway configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => run_serve(cli.config, cli.log_level).await,
        Commands::Init { output, bucket } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"), "pretty");
            run_init(output, bucket)
        }
        Commands::Validate => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"), "pretty");
            run_validate(cli.config)
        }
        Commands::Info => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"), "pretty");
            run_info(cli.config)
        }
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Start the gateway
async fn run_serve(config_path: PathBuf, log_level: Option<String>) -> Result<()> {
    let config = match WolfMediaConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            init_logging(log_level.as_deref().unwrap_or("info"), "pretty");
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            tracing::error!("Please check that the config file exists and is valid TOML");
            return Err(e);
        }
    };

    let level = log_level.unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, &config.logging.format);

    tracing::info!("Starting WolfMedia gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Public URL: {}", config.public_url());

    let store = storage::from_config(&config.storage)?;
    let server = HttpServer::new(&config, store);
    server.start().await
}

fn run_init(output: PathBuf, bucket: String) -> Result<()> {
    let config_content = format!(r#"# WolfMedia Configuration
# Generated configuration file

[server]
bind_address = "0.0.0.0:8787"
# Base URL the bucket's objects are publicly served from
public_url = "https://media.example.com"

[auth]
# Shared bearer token; WOLFMEDIA_API_KEY overrides this value
api_key = "changeme"

[storage]
backend = "s3"
bucket = "{bucket}"
region = "auto"
# endpoint = "https://<account-id>.r2.cloudflarestorage.com"
# access_key / secret_key may also come from WOLFMEDIA_S3_ACCESS_KEY / WOLFMEDIA_S3_SECRET_KEY
# access_key = ""
# secret_key = ""
path_style = true

[logging]
level = "info"
format = "pretty"
"#);

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to configure your bucket and API key.");
    println!("Then start with: wolfmedia --config {} serve", output.display());

    Ok(())
}

fn run_validate(config_path: PathBuf) -> Result<()> {
    match WolfMediaConfig::from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Bind Address: {}", config.server.bind_address);
            println!("  Public URL:   {}", config.public_url());
            println!("  Backend:      {:?}", config.storage.backend);
            if config.storage.backend == StorageBackend::S3 {
                println!("  Bucket:       {}", config.storage.bucket);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}

fn run_info(config_path: PathBuf) -> Result<()> {
    let config = WolfMediaConfig::from_file(&config_path)?;

    println!("WolfMedia Gateway Information");
    println!("=============================");
    println!();
    println!("Bind Address:     {}", config.server.bind_address);
    println!("Public URL:       {}", config.public_url());
    println!("API Key:          {}", mask(&config.auth.api_key));
    println!();
    println!("Storage Configuration:");
    println!("  Backend:        {:?}", config.storage.backend);
    println!("  Bucket:         {}", config.storage.bucket);
    println!("  Region:         {}", config.storage.region);
    println!("  Endpoint:       {}", config.storage.endpoint.as_deref().unwrap_or("(default)"));
    println!("  Access Key:     {}", config.storage.access_key.as_deref().map(mask).unwrap_or_else(|| "(environment)".into()));
    println!("  Path Style:     {}", config.storage.path_style);
    println!();
    println!("Upload Policy:");
    println!("  Max Size:       {} MB", MAX_FILE_SIZE / (1024 * 1024));
    println!("  Types:          {}", ALLOWED_TYPES.join(", "));
    println!("  List Limit:     {}", LIST_LIMIT);

    Ok(())
}

/// Hide all but the first characters of a secret
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(3).collect();
    format!("{}***", visible)
}
