use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use canteen_api::{CacheLocation, CanteenApi, PageOutcome, PageQuery, SessionConfig};
use canteen_store::LoadOutcome;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "canteenctl", version, about = "Campus venue search CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Disable the durable index cache for this run
    #[arg(long = "no-cache", global = true, action = ArgAction::SetTrue)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search venues; an empty keyword lists server-side
    Search {
        /// Keyword (Chinese, pinyin or Latin)
        keyword: String,
        /// Category filter, e.g. "mainfood"
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long = "page", default_value_t = 1)]
        page: usize,
        /// Page size
        #[arg(long = "limit", default_value_t = canteen_api::DEFAULT_PAGE_SIZE)]
        limit: usize,
        /// Print tier and score per match instead of hydrating
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Reload the index from the network and rewrite the cache
    Refresh,
    /// Inspect or drop the durable index cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show stored version and record count
    Show,
    /// Remove both cache keys
    Clear,
}

fn init_tracing() {
    let env = std::env::var("CANTEEN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("CANTEEN_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid CANTEEN_METRICS_ADDR; expected host:port");
        }
    }
}

fn print_load(output: Output, outcome: &LoadOutcome) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        Output::Human => match outcome {
            LoadOutcome::Cache { records } => println!("index: {} records (cache)", records),
            LoadOutcome::Network { records } => println!("index: {} records (network)", records),
            LoadOutcome::StaleFallback { records, error } => println!("index: {} records (stale; network error: {})", records, error),
            LoadOutcome::Failed { error } => println!("index: failed to load: {}", error),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let mut cfg = SessionConfig::from_env();
    if cli.no_cache { cfg.cache = CacheLocation::Off; }
    let api: Arc<dyn CanteenApi> = Arc::new(canteen_api::open_session(&cfg).context("opening search session")?);

    match cli.command {
        Commands::Search { keyword, kind, page, limit, explain } => {
            info!(keyword = %keyword, kind = ?kind, page, limit, explain, "search invoked");
            let needs_index = explain || !keyword.trim().is_empty();
            if needs_index {
                let outcome = api.load_index(false).await;
                if outcome.is_failed() {
                    print_load(cli.output, &outcome)?;
                    return Ok(());
                }
            }
            if explain {
                let rows = api.explain(&keyword);
                match cli.output {
                    Output::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    Output::Human => {
                        if rows.is_empty() { println!("no matches"); }
                        for r in rows {
                            println!("{:>3}  {:<10} {}", r.score, r.tier.as_str(), r.id);
                        }
                    }
                }
                return Ok(());
            }
            let mut q = PageQuery::new(keyword).page(page, limit);
            if let Some(k) = kind { q = q.kind(k); }
            let outcome = api.query(q).await.context("search query")?;
            match cli.output {
                Output::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Output::Human => match outcome {
                    PageOutcome::Page(p) => {
                        if p.items.is_empty() { println!("no results"); }
                        for item in &p.items {
                            let name = item.field_str("name").unwrap_or("-");
                            let kind = item.field_str("type").unwrap_or("-");
                            println!("{}  {}  [{}]", item.id, name, kind);
                        }
                        println!("page {}/{} • {} total", p.page, p.total_pages().max(1), p.total);
                    }
                    PageOutcome::Loading => println!("index still loading"),
                    PageOutcome::Superseded => warn!("request superseded"),
                },
            }
        }
        Commands::Refresh => {
            let outcome = api.load_index(true).await;
            print_load(cli.output, &outcome)?;
        }
        Commands::Cache { action: CacheAction::Show } => {
            let status = api.status();
            match cli.output {
                Output::Json => println!("{}", serde_json::to_string_pretty(&status.cached)?),
                Output::Human => match status.cached {
                    Some(c) => println!(
                        "cache: version {} ({}) • {} records",
                        c.version,
                        if c.current { "current" } else { "stale" },
                        c.records
                    ),
                    None => println!("cache: empty (expects version {})", status.cache_version),
                },
            }
        }
        Commands::Cache { action: CacheAction::Clear } => {
            api.clear_cache();
            if cli.output == Output::Human { println!("cache cleared"); }
        }
    }
    Ok(())
}
