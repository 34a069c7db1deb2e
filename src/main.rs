//! Promotion dispatcher CLI - main entry point
//!
//! One invocation performs one action; schedule `send` externally (cron,
//! platform scheduler) to post promotions over the day.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use promo_dispatch::commands::{self, Services};
use promo_dispatch::{config, metrics, Config, DispatchOutcome, Dispatcher, LinkShortener};

#[derive(Parser)]
#[command(name = "promo_dispatch")]
#[command(about = "Post the next pending promotion from a Google Sheet to Telegram", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./promo.yml when present)
    #[arg(long, env = "PROMO_CONFIG")]
    config: Option<PathBuf>,

    /// Write Prometheus metrics to this file after the command (textfile collector)
    #[arg(long, env = "PROMO_METRICS_FILE")]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post the next pending promotion and mark it as sent
    Send {
        /// Skip the opener message
        #[arg(long, default_value_t = false)]
        no_greeting: bool,

        /// Post the original link even if a shortener is configured
        #[arg(long, default_value_t = false)]
        no_shorten: bool,
    },

    /// Post only the opener message
    Greet,

    /// List pending promotions
    Pending,

    /// Print the post the next `send` would publish
    Preview {
        /// Render the original link even if a shortener is configured
        #[arg(long, default_value_t = false)]
        no_shorten: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Send { .. } => "send",
            Commands::Greet => "greet",
            Commands::Pending => "pending",
            Commands::Preview { .. } => "preview",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    config::load_dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("promo_dispatch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let command_name = cli.command.name();

    info!(command = command_name, started_at = %Local::now(), "Starting");
    let start = Instant::now();

    let result = execute_command(cli.command, cli.config.as_deref()).await;

    metrics::record_command_duration(command_name, start.elapsed());
    if let Some(path) = cli.metrics_file.as_deref() {
        if let Err(err) = metrics::write_textfile(path) {
            warn!(path = %path.display(), "Failed to write metrics: {}", err);
        }
    }

    info!(command = command_name, finished_at = %Local::now(), "Done");
    result
}

async fn execute_command(command: Commands, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let services = Services::from_config(&config)?;
    info!(
        spreadsheet = services.catalog.spreadsheet_id(),
        chat_id = services.channel.chat_id(),
        "Configuration loaded"
    );

    match command {
        Commands::Send {
            no_greeting,
            no_shorten,
        } => {
            let mut dispatcher = dispatcher(&services, no_shorten);
            if !no_greeting {
                dispatcher = dispatcher.with_greeting(&services.greeting);
            }

            let result = commands::send::run(&dispatcher).await?;
            if result.outcome == DispatchOutcome::DeliveryFailed {
                anyhow::bail!(
                    "delivery failed: {}",
                    result.error.unwrap_or_default()
                );
            }
        }
        Commands::Greet => {
            if !commands::greet::run(&services.channel, &services.greeting).await? {
                warn!("Greeting is empty in settings, nothing sent");
            }
        }
        Commands::Pending => {
            commands::pending::run(&services.catalog).await?;
        }
        Commands::Preview { no_shorten } => {
            let dispatcher = dispatcher(&services, no_shorten);
            commands::preview::run(&dispatcher).await?;
        }
    }

    Ok(())
}

fn dispatcher(services: &Services, no_shorten: bool) -> Dispatcher<'_> {
    let dispatcher = Dispatcher::new(&services.catalog, &services.channel);
    match services.shortener.as_ref() {
        Some(shortener) if !no_shorten => dispatcher.with_shortener(shortener as &dyn LinkShortener),
        _ => dispatcher,
    }
}
