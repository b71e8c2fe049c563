//! Trend-bot token discovery bot
//!
//! Asks a trend bot for trending tweets/profiles, scrapes the mentioned
//! pages through mirrors, and posts a source-attributed address summary.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trendscout_bot::{
    config::Config,
    correlator::ResponseCorrelator,
    discovery::DiscoveryEngine,
    extract,
    notify::Notifier,
    parser,
    report::AggregationSummary,
    scraper::{MirrorScraper, DEFAULT_MIRRORS},
    store::MessageBuffer,
};

#[derive(Parser)]
#[command(name = "trendscout-bot")]
#[command(about = "Discovers trending token addresses via a trend bot and page mirrors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path; the default locations are searched when absent
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one discovery run against the configured group chat
    Run,
    /// Extract address candidates from text (debugging aid)
    Extract {
        /// Text to extract from
        text: String,
    },
    /// Parse a trend-reply blob and print the structured result
    Parse {
        /// Text to parse
        text: String,
    },
    /// Scan one or more URLs through the mirror list
    Scan {
        /// Source URLs
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = load_config(cli.config.as_deref())?;
            run_discovery(config).await
        }
        Commands::Extract { text } => {
            let found = extract::extract_addresses(&text);
            println!("EVM ({}):", found.evm.len());
            for addr in &found.evm {
                println!("  {addr}");
            }
            println!("SOL ({}):", found.sol.len());
            for addr in &found.sol {
                println!("  {addr}");
            }
            Ok(())
        }
        Commands::Parse { text } => {
            let parsed = parser::parse(&text);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        Commands::Scan { urls } => {
            let config = load_config(cli.config.as_deref()).unwrap_or_else(|_| Config {
                telegram: Default::default(),
                scraper: Default::default(),
                report: Default::default(),
            });
            let scraper = MirrorScraper::new(&config.scraper)?;
            let result = scraper.scan(&urls).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
}

async fn run_discovery(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting trend discovery run");

    // The one run-fatal misconfiguration: no target chat
    let chat_id = config
        .telegram
        .group_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("telegram.group_id is required for a discovery run"))?;

    let notifier = Arc::new(match &config.telegram.bot_token {
        Some(token) if !token.is_empty() => Notifier::new(token.clone()),
        _ => {
            tracing::warn!("No bot token configured, notifications disabled");
            Notifier::disabled()
        }
    });

    // The buffer is fed by whatever session layer the deployment wires in;
    // a fresh run without one still works through the push/relaxed paths.
    let store = Arc::new(MessageBuffer::new(512));

    let correlator = ResponseCorrelator::new(store, notifier.clone())
        .expected_sender(&config.telegram.trend_bot_handle)
        .text_hints(config.telegram.response_hints.clone())
        .poll_interval(std::time::Duration::from_secs(
            config.telegram.poll_interval_secs,
        ));

    let scraper = MirrorScraper::new(&config.scraper)?;

    let mut mirror_hosts: Vec<String> = Vec::new();
    if let Some(primary) = &config.scraper.primary_mirror {
        mirror_hosts.push(primary.clone());
    }
    mirror_hosts.extend(config.scraper.fallback_mirrors.iter().cloned());
    mirror_hosts.extend(DEFAULT_MIRRORS.iter().map(|m| m.to_string()));
    let summary = AggregationSummary::new(mirror_hosts, config.report.max_chunk_len);

    let engine = DiscoveryEngine::new(correlator, scraper, summary, notifier, &config.telegram);

    match engine.run(&chat_id).await? {
        Some(discovery) => {
            tracing::info!(
                evm = discovery.evm_addresses.len(),
                sol = discovery.solana_addresses.len(),
                "Discovery complete"
            );
            Ok(())
        }
        None => {
            tracing::warn!("No data returned from trend bot");
            std::process::exit(1);
        }
    }
}
