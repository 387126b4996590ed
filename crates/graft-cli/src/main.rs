//! graft CLI
//!
//! Command-line interface for graft - resolve linked CMS content into plain JSON.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use graft_core::{Client, Config, QueryOptions, ResolveError, TransientError};

mod commands;
mod media;
mod output;
mod source;

use commands::list::ListArgs;
use output::{Output, OutputFormat};
use source::AnySource;

/// Environment variable overriding the log filter level
const LOG_ENV: &str = "GRAFT_LOG";

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "graft - Resolve linked CMS content into plain JSON")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read entries from a payload file instead of the API
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Locale catalog to pair with --file
    #[arg(long, global = true)]
    locales_file: Option<PathBuf>,

    /// Rewrite protocol-relative media URLs to https
    #[arg(long, global = true)]
    absolute_urls: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one model by ID
    Get {
        /// Record ID
        id: String,
        /// Locale code, or '*' for every locale
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Resolve a page of models
    #[command(alias = "ls")]
    List(ListArgs),
    /// List the locales of the space
    Locales,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (space_id, access_token, environment, host, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need a content source
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config =
        Config::load_with_cli_override(cli.config.as_ref()).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let source = AnySource::select(
        &config,
        cli.file.as_deref(),
        cli.locales_file.as_deref(),
    )?;
    let client = Client::new(source);

    let mut options = QueryOptions::default();
    if cli.absolute_urls {
        options = options.with_media_transform(Arc::new(media::AbsoluteUrls));
    }

    let result = match cli.command {
        Commands::Get { id, locale } => {
            commands::get::get(&client, id, locale, options, &output).await
        }
        Commands::List(args) => commands::list::list(&client, &args, options, &output).await,
        Commands::Locales => commands::locales::list(client.source(), &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    if let Err(ref e) = result {
        if is_retryable(e) && output.format != OutputFormat::Quiet {
            eprintln!("⚠ The content source may be temporarily unavailable; try again shortly.");
        }
    }

    result
}

/// Whether a command failed on a transient source error
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ResolveError>()
        .is_some_and(ResolveError::is_recoverable)
        || err.downcast_ref::<TransientError>().is_some()
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log level for the verbosity count, unless GRAFT_LOG overrides it
fn log_level(verbose: u8) -> String {
    if let Ok(level) = std::env::var(LOG_ENV) {
        if !level.is_empty() {
            return level;
        }
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
    .to_string()
}

/// Initialize logging to stderr, or to the configured log file
fn init_logging(config: &Config, verbose: u8) {
    let level = log_level(verbose);
    let env_filter = EnvFilter::new(format!("graft_core={},graft_cli={}", level, level));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    debug!("Logging initialized at level {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let transient: ResolveError = anyhow::Error::new(TransientError::new("503")).into();
        let err = anyhow::Error::new(transient).context("Failed to resolve models");
        assert!(is_retryable(&err));

        // Locale catalog failures arrive without a ResolveError wrapper
        let err = anyhow::Error::new(TransientError::new("timed out")).context("Failed to fetch locales");
        assert!(is_retryable(&err));

        let permanent: ResolveError = anyhow::anyhow!("401 Unauthorized").into();
        assert!(!is_retryable(&anyhow::Error::new(permanent)));
        assert!(!is_retryable(&anyhow::Error::new(ResolveError::NotFound {
            id: "e1".to_string()
        })));
    }
}
