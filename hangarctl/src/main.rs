//! `hangarctl`: run simulated installs and inspect the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hangar_config::{ConfigLoad, ConfigLoader, HangarConfig};

mod logging;
mod simulate;

use simulate::SimulateOptions;

#[derive(Parser)]
#[command(
    name = "hangarctl",
    about = "Hangar installation lifecycle tooling",
    version
)]
struct Cli {
    /// Config file to use instead of HANGAR_CONFIG_PATH / default discovery
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Env file loaded before configuration is resolved
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install servers into an in-memory store and watch the simulated lifecycle
    Simulate {
        /// Server ids to install (repeatable)
        #[arg(long = "server", value_name = "SERVER_ID")]
        servers: Vec<String>,
        /// Number of generated servers when no --server is given
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Divide every configured delay by this factor
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        speed: u64,
        /// Disable hop jitter for reproducible timing
        #[arg(long)]
        no_jitter: bool,
        /// Mark this server STOPPED once its installation reaches INSTALLING
        #[arg(long, value_name = "SERVER_ID")]
        stop_at_installing: Option<String>,
        /// Status polling interval in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
        /// Print simulated health metrics for every installation at the end
        #[arg(long)]
        health: bool,
    },
    /// Print the effective configuration
    Config {
        #[arg(long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env_file.exists() {
        dotenvy::from_path(&cli.env_file).with_context(|| {
            format!("failed to load env file {}", cli.env_file.display())
        })?;
    }

    let ConfigLoad {
        config,
        source,
        warnings,
    } = load_config(cli.config.as_ref())?;

    logging::init_tracing(&config.logging.filter);
    tracing::debug!(source = %source, "configuration resolved");
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => tracing::warn!("{} ({hint})", warning.message),
            None => tracing::warn!("{}", warning.message),
        }
    }

    match cli.command {
        Command::Simulate {
            servers,
            count,
            speed,
            no_jitter,
            stop_at_installing,
            poll_ms,
            health,
        } => {
            let options = SimulateOptions {
                servers,
                count,
                speed,
                no_jitter,
                stop_at_installing,
                poll_ms,
                health,
            };
            simulate::run(&config, options).await
        }
        Command::Config { format } => print_config(&config, format),
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<ConfigLoad> {
    let loader = match explicit {
        Some(path) => ConfigLoader::with_env([(
            hangar_config::loader::CONFIG_PATH_ENV,
            path.display().to_string(),
        )]),
        None => ConfigLoader::new(),
    };
    loader.load().context("failed to load configuration")
}

fn print_config(config: &HangarConfig, format: ConfigFormat) -> Result<()> {
    let rendered = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .context("failed to render configuration as TOML")?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .context("failed to render configuration as JSON")?,
    };
    println!("{rendered}");
    Ok(())
}
