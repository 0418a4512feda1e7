//! fixerbot - Thunderstore mod lookup bot
//!
//! `serve` runs the bot against the console gateway; `lookup` answers a
//! single query and exits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fixerbot::catalog::{RecordCache, ThunderstoreSource};
use fixerbot::config::BotConfig;
use fixerbot::console::{self, ConsoleGateway, CONSOLE_CHANNEL};
use fixerbot::dispatch::{Dispatcher, OutboundMessage};
use fixerbot::summary::SummaryBuilder;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "fixerbot",
    about = "Answers {{mod name}} lookups against the Thunderstore registry",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Configuration file (YAML); defaults are used if it does not exist
    #[clap(long, default_value = "fixerbot.yaml", global = true)]
    config: PathBuf,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read messages from stdin and answer every {{name}} trigger
    Serve {
        /// Treat console input as coming from a moderator ({{reloadcache}})
        #[clap(long)]
        admin: bool,
    },

    /// Fetch the registry once and answer a single query
    Lookup {
        /// Mod name to look up
        query: String,
    },
}

fn initialize_tracing(log_level: &LogLevel) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries replies
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let config = BotConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    debug!(?config, "Loaded configuration");

    let source = ThunderstoreSource::new(config.index_url.clone(), &config.user_agent)
        .context("Failed to create registry client")?;
    let cache = Arc::new(RecordCache::new(Arc::new(source), config.fetch_timeout()));

    match cli.command {
        Command::Serve { admin } => serve(config, cache, admin).await,
        Command::Lookup { query } => lookup(config, cache, &query).await,
    }
}

async fn serve(config: BotConfig, cache: Arc<RecordCache>, admin: bool) -> Result<()> {
    let refresher = cache.spawn_refresh_loop(config.refresh_interval());
    info!(
        index = %config.index_url,
        every_minutes = config.refresh_interval_minutes,
        "Serving lookups from stdin"
    );

    let dispatcher = Arc::new(
        Dispatcher::new(cache, Arc::new(ConsoleGateway), config.summary_settings())
            .with_max_concurrent_lookups(config.max_concurrent_lookups),
    );
    console::run(dispatcher, admin)
        .await
        .context("Console gateway failed")?;

    refresher.abort();
    Ok(())
}

async fn lookup(config: BotConfig, cache: Arc<RecordCache>, query: &str) -> Result<()> {
    let snapshot = cache.refresh().await;
    if snapshot.is_empty() {
        anyhow::bail!("Registry returned no packages from {}", config.index_url);
    }

    let settings = config.summary_settings();
    let reply = SummaryBuilder::new(snapshot.records(), &settings).respond(query);
    let message = OutboundMessage {
        channel_id: CONSOLE_CHANNEL.to_string(),
        reply_to: None,
        mention_author: false,
        body: reply,
        color: settings.embed_color,
    };
    println!("{}", console::render(&message));
    Ok(())
}
