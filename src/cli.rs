//! CLI interface for edusmart

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::store::PersistenceGateway;

#[derive(Parser)]
#[command(name = "edusmart")]
#[command(about = "Homework help API: learner accounts, AI-answered queries and learning materials", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server (default when no command given)
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
    },
    /// Configure the server
    Config {
        /// Store the LLM provider API key in the keyring
        #[arg(long)]
        set_api_key: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Check whether the configured durable store is reachable
    Health,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            crate::server::start(None, None).await?;
        }
        Some(Commands::Serve { port, host }) => {
            crate::server::start(host, port).await?;
        }
        Some(Commands::Config { set_api_key, show }) => {
            if let Some(key) = set_api_key {
                config::set_api_key(&key)?;
            } else if show {
                config::show_config()?;
            } else {
                println!("Configuration file: {}", config::config_path()?.display());
                println!();
                println!("Use --show to display the current configuration");
                println!("Use --set-api-key KEY to store the LLM API key");
                println!();
                println!("Defaults:");
                println!("{}", config::default_config_toml());
            }
        }
        Some(Commands::Health) => {
            let config = Config::load()?;
            let gateway = PersistenceGateway::from_config(&config.storage).await;
            let connected = gateway.probe().await;

            println!(
                "Database: {}",
                config.storage.database_url.as_deref().unwrap_or("(none)")
            );
            if connected {
                println!("✓ Durable store reachable (production mode)");
            } else {
                println!("⚠ Durable store unreachable (demo mode)");
            }
        }
    }

    Ok(())
}
