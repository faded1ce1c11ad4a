//! cloud-config-dump: fetch an application's configuration and print it.
//!
//! Decrypted secrets are printed verbatim.

use clap::Parser;
use cloud_config_client::core::DEFAULT_ENV_PREFIX;
use cloud_config_client::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Fetch configuration from a Spring Cloud Config server and dump it as JSON
#[derive(Parser)]
#[command(name = "cloud-config-dump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (YAML, TOML or JSON); CLOUD_CONFIG_* variables override it
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Base URL of the configuration server
    #[arg(long)]
    url: Option<String>,

    /// Application name
    #[arg(short, long)]
    application: Option<String>,

    /// Comma-separated profiles
    #[arg(short, long)]
    profiles: Option<String>,

    /// Label (branch or tag)
    #[arg(short, long)]
    label: Option<String>,

    /// Print only this key, falling back to environment variables
    #[arg(short, long)]
    key: Option<String>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = ConnectionSettings::load(cli.settings.as_deref(), DEFAULT_ENV_PREFIX)?;
    if let Some(url) = cli.url {
        settings = settings.with_base_url(url);
    }
    if let Some(application) = cli.application {
        settings = settings.with_application_name(application);
    }
    if let Some(profiles) = cli.profiles {
        settings = settings.with_profiles(&profiles);
    }
    if let Some(label) = cli.label {
        settings = settings.with_label(label);
    }

    let config = CloudConfig::builder()
        .with_settings(settings)
        .with_fallback(EnvResolver::new())
        .build()
        .await?;

    match cli.key {
        Some(key) => match config.resolve(&key) {
            Some(value) => println!("{}", value),
            None => return Err(ConfigError::UnresolvablePlaceholder(key)),
        },
        None => {
            let json = serde_json::to_string_pretty(&config.dump_all())
                .map_err(|e| ConfigError::Settings(format!("Failed to render JSON: {}", e)))?;
            println!("{}", json);
        }
    }

    Ok(())
}
