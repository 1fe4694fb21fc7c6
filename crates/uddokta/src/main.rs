//! Uddokta - AI marketing posters for small businesses.
//!
//! Serves the poster generation endpoint used by the Uddokta dashboard and
//! exposes the same chain on the command line.
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP API on :5000
//! uddokta serve
//!
//! # Generate a poster once and save the image
//! uddokta generate "Eid sale on sarees" --stats '{"discount":"20%"}' --output poster.png
//!
//! # Try the image models alone
//! uddokta image "A vibrant fantasy landscape" --output test.png
//!
//! # View configuration
//! uddokta config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// Uddokta - AI marketing posters for small businesses.
#[derive(Parser, Debug)]
#[command(name = "uddokta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "UDDOKTA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the poster generation HTTP API
    Serve(cli::serve::ServeArgs),

    /// Generate one poster and print the JSON response
    Generate(cli::generate::GenerateArgs),

    /// Render a prompt with the image models only
    Image(cli::image::ImageArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Provider keys usually live in a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => uddokta_core::Config::load_from(path),
        None => uddokta_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `uddokta config path`."
            );
            let mut config = uddokta_core::Config::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Uddokta v{}", uddokta_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Generate(args) => cli::generate::execute(args, &config).await,
        Commands::Image(args) => cli::image::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()).await,
    }
}
