use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rift_ledger::config::AppConfig;
use rift_ledger::dashboard::DashboardState;
use rift_ledger::fetch::cache::DocumentCache;
use rift_ledger::fetch::{Endpoint, MatchApi, RiotClient};
use rift_ledger::models::{MatchId, RiotId};
use rift_ledger::parse_duration;
use rift_ledger::reference::ReferenceSource;
use rift_ledger::storage::{MatchIndexStore, PlayerStore, StatDataStore};
use rift_ledger::sync::{register_player, UpdateOptions, UpdateOrchestrator, UpdateReport};

#[derive(Parser)]
#[command(name = "rift-ledger")]
#[command(about = "Incremental League of Legends match history and champion statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a player and build their history from scratch
    Init {
        /// Riot ID, e.g. "Faker#KR1"
        #[arg(long)]
        riot_id: String,

        /// Regional routing host prefix (defaults to riot.region)
        #[arg(long)]
        region: Option<String>,

        /// API key (defaults to the env var named by riot.api_key_env)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Fetch matches played since the last update
    Update {
        /// Discard stored state and rebuild from full history
        #[arg(long)]
        fresh: bool,

        /// Stop processing matches after this long (e.g. "30m")
        #[arg(long)]
        timeout: Option<String>,

        #[arg(long)]
        api_key: Option<String>,
    },

    /// Print statistics and rune page picks for one champion and role
    Show {
        #[arg(long)]
        champion: String,

        /// TOP, JUNGLE, MIDDLE, BOTTOM or UTILITY
        #[arg(long)]
        role: String,

        /// Use cached rune/item catalogues only
        #[arg(long)]
        offline: bool,
    },

    /// Print a summary of the match index
    Index,

    /// Print the raw payload for one match
    FetchMatch {
        match_id: String,

        /// Fetch the timeline instead of the match detail
        #[arg(long)]
        timeline: bool,

        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    let (plain, json) = if cli.json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();

    tracing::info!("Starting rift-ledger v{}", env!("CARGO_PKG_VERSION"));

    let storage = config.storage();

    match cli.command {
        Commands::Init {
            riot_id,
            region,
            api_key,
        } => {
            let riot_id: RiotId = riot_id.parse().map_err(|e: String| anyhow!(e))?;
            let region = region.unwrap_or_else(|| config.riot.region.clone());
            let api_key = config.resolve_api_key(api_key)?;

            let api: Arc<dyn MatchApi> =
                Arc::new(RiotClient::new(config.riot_client_config(&region, api_key))?);
            let player = register_player(api.as_ref(), &storage, riot_id, &region).await?;
            println!("Registered {} ({})", player.riot_id, player.puuid);

            let orchestrator = UpdateOrchestrator::new(config.sync_config(), api, player);
            let report = orchestrator
                .update(UpdateOptions {
                    fresh: true,
                    deadline: None,
                })
                .await?;
            print_report(&report);
            report.into_result()?;
        }

        Commands::Update {
            fresh,
            timeout,
            api_key,
        } => {
            let deadline = timeout
                .map(|t| parse_duration(&t).ok_or_else(|| anyhow!("Invalid --timeout: {}", t)))
                .transpose()?;
            let player = PlayerStore::new(&storage)
                .load()
                .context("No tracked player; run `rift-ledger init` first")?;
            let api_key = config.resolve_api_key(api_key)?;

            let api = Arc::new(RiotClient::new(
                config.riot_client_config(&player.region, api_key),
            )?);
            let orchestrator = UpdateOrchestrator::new(config.sync_config(), api, player);
            let report = orchestrator.update(UpdateOptions { fresh, deadline }).await?;
            print_report(&report);
            report.into_result()?;
        }

        Commands::Show {
            champion,
            role,
            offline,
        } => {
            let table = StatDataStore::new(&storage).load()?;
            let cache = DocumentCache::new(config.document_cache_config())?;
            let source = ReferenceSource::new(
                cache,
                &config.metadata.perks_url,
                &config.metadata.items_url,
            )?;
            let references = if offline {
                source.load_offline().await
            } else {
                source.load().await?
            };

            let state = DashboardState::new(table, references);
            let data = state.champion_data(&champion, &role);
            if data.is_empty() {
                tracing::warn!("No games recorded for {} in {}", data.champion, data.role);
            }
            let runepages = state.runepage_recommendations(&champion, &role);

            let output = serde_json::json!({
                "champion": data,
                "runepages": runepages,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Index => {
            let index = MatchIndexStore::new(&storage).load()?;
            let rows = StatDataStore::new(&storage).load()?.len();

            println!("\n=== Match Index ===");
            println!("Latest:           {}", index.latest);
            println!("Matches:          {}", index.len());
            println!("Stat rows:        {}", rows);
            for id in index.newest(10) {
                println!("  {}", id);
            }
        }

        Commands::FetchMatch {
            match_id,
            timeline,
            api_key,
        } => {
            let region = match PlayerStore::new(&storage).load() {
                Ok(player) => player.region,
                Err(_) => config.riot.region.clone(),
            };
            let api_key = config.resolve_api_key(api_key)?;
            let client = RiotClient::new(config.riot_client_config(&region, api_key))?;

            let id = MatchId::from(match_id);
            let payload = if timeline {
                client.match_timeline(&id).await?
            } else {
                client.get(Endpoint::Match(&id), &[]).await?
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn print_report(report: &UpdateReport) {
    println!("\n=== Update Results ===");
    println!("New matches:      {}", report.new_matches);
    println!("Processed:        {}", report.matches_processed);
    println!("Rows appended:    {}", report.rows_appended);
    println!("Total rows:       {}", report.total_rows);
    if let Some(err) = &report.failure {
        println!("\nStopped early: {}", err);
    }
}
