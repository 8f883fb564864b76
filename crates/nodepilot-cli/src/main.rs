//! # nodepilot CLI Entry Point
//!
//! Main binary for the nodepilot selection engine. Loads a node inventory,
//! picks the best node under the configured strategy, and optionally keeps
//! monitoring node health with automatic failover.
//!
//! ## Usage
//!
//! ```bash
//! # Run the engine over an inventory with simulated probes
//! nodepilot run demos/nodes.json
//!
//! # Probe real endpoints over HTTP, checking every 30 seconds
//! nodepilot run demos/nodes.json --http --interval 30
//!
//! # One-shot ranking as raw JSON (pipe to jq)
//! nodepilot rank demos/nodes.json --strategy fastest | jq '.[0]'
//! ```
//!
//! ## Inventory Format
//!
//! A JSON array of nodes:
//!
//! ```json
//! [
//!   { "id": 0, "name": "US-West-1", "region": "US-West",
//!     "latency_ms": 42.0, "reliability": 97.0, "load": 31.0,
//!     "endpoint": "http://10.0.0.1:8080" }
//! ]
//! ```
//!
//! The `endpoint` field is only required with `--http`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use nodepilot_engine::{
    scorer, HttpProbe, JsonFileStore, LogNotifier, Node, SelectorError, SelectorSettings,
    SimulatedProbe, SmartSelector, Strategy,
};

/// Validates that a URL string starts with http:// or https://
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

/// Loads a node inventory from a JSON file.
fn load_inventory(path: &str) -> Result<Vec<Node>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read inventory {}", path))?;
    let nodes: Vec<Node> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse inventory {}", path))?;
    Ok(nodes)
}

#[derive(FromArgs)]
/// nodepilot - smart node selection and auto-failover
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Run(RunArgs),
    Rank(RankArgs),
}

/// Arguments for running the selection engine.
///
/// Loads the inventory, applies persisted settings (plus any overrides
/// given here), selects the best node, and keeps monitoring node health
/// until interrupted. Failovers are logged and recorded in the history.
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
/// run the selection engine over a node inventory
struct RunArgs {
    /// path to the JSON node inventory file
    #[argh(positional)]
    inventory: String,

    /// path to the persisted settings file
    ///
    /// Created on first change. Malformed or missing settings fall back to
    /// the defaults (balanced strategy, 3-failure threshold, 60s interval).
    #[argh(option, long = "settings", default = "\"nodepilot-settings.json\".into()")]
    settings: String,

    /// selection strategy override (balanced, fastest, reliable, load-balance)
    ///
    /// Overrides the persisted strategy and its weight preset.
    #[argh(option, short = 's', long = "strategy")]
    strategy: Option<Strategy>,

    /// health-check interval override in seconds
    #[argh(option, long = "interval")]
    interval_secs: Option<u64>,

    /// consecutive-failure threshold override
    #[argh(option, long = "threshold")]
    threshold: Option<u32>,

    /// probe node endpoints over HTTP instead of simulating
    ///
    /// Every node in the inventory must carry an endpoint with the
    /// http:// or https:// prefix.
    #[argh(switch, long = "http")]
    http: bool,

    /// success rate for the simulated probe (0.0 - 1.0)
    ///
    /// Ignored with --http. Defaults to 0.95.
    #[argh(option, long = "success-rate", default = "0.95")]
    success_rate: f64,

    /// exit after this many seconds instead of waiting for ctrl-c
    #[argh(option, long = "duration")]
    duration_secs: Option<u64>,
}

/// Arguments for a one-shot ranking.
///
/// Scores and ranks the inventory under a strategy preset and writes the
/// result as raw JSON to stdout. No logging is initialized, so the output
/// stays clean for unix tool usage (piping to jq, etc.).
#[derive(FromArgs)]
#[argh(subcommand, name = "rank")]
/// rank an inventory and output raw JSON
struct RankArgs {
    /// path to the JSON node inventory file
    #[argh(positional)]
    inventory: String,

    /// selection strategy (balanced, fastest, reliable, load-balance)
    ///
    /// Defaults to balanced.
    #[argh(option, short = 's', long = "strategy", default = "Strategy::Balanced")]
    strategy: Strategy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // rank keeps stdout clean for scripting; only run gets logging
    if matches!(cli.command, Commands::Run(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Run(args) => run_engine(args).await,
        Commands::Rank(args) => run_rank(args),
    }
}

/// Executes the `run` subcommand.
async fn run_engine(args: RunArgs) -> Result<()> {
    let nodes = load_inventory(&args.inventory)?;
    if nodes.is_empty() {
        anyhow::bail!("inventory {} contains no nodes", args.inventory);
    }
    tracing::info!("loaded {} nodes from {}", nodes.len(), args.inventory);

    let probe: Arc<dyn nodepilot_engine::HealthProbe> = if args.http {
        for node in &nodes {
            let endpoint = node.endpoint.as_deref().ok_or_else(|| {
                anyhow::anyhow!("node {} has no endpoint (required with --http)", node.name)
            })?;
            validate_http_url(endpoint, "node endpoint")?;
        }
        tracing::info!("probing node endpoints over HTTP");
        Arc::new(HttpProbe::default())
    } else {
        tracing::info!(
            "using simulated probes ({}% success rate)",
            args.success_rate * 100.0
        );
        Arc::new(SimulatedProbe::new(args.success_rate))
    };

    let selector = SmartSelector::with_collaborators(
        nodes,
        SelectorSettings::default(),
        probe,
        Arc::new(LogNotifier),
        Arc::new(JsonFileStore::new(Path::new(&args.settings))),
    );
    selector.load_settings().await;

    if let Some(strategy) = args.strategy {
        selector.set_strategy(strategy).await?;
    }
    if let Some(secs) = args.interval_secs {
        selector.set_check_interval(secs).await?;
    }
    if let Some(threshold) = args.threshold {
        selector.set_failure_threshold(threshold).await?;
    }

    let settings = selector.settings().await;
    tracing::info!(
        "strategy: {} ({})",
        settings.strategy,
        settings.strategy.description()
    );

    match selector.select_best_node().await {
        Ok(selection) => {
            for (rank, candidate) in selection.candidates.iter().enumerate() {
                tracing::info!(
                    "  {}. {} [{}] {:.0}ms (score {:.1})",
                    rank + 1,
                    candidate.name,
                    candidate.region,
                    candidate.latency_ms,
                    candidate.score
                );
            }
        }
        Err(SelectorError::NoCandidates) => {
            anyhow::bail!("no online nodes available for selection");
        }
        Err(e) => return Err(e.into()),
    }

    if settings.failover_enabled {
        selector.start_monitoring().await;
    } else {
        tracing::info!("auto-failover disabled, not monitoring");
    }

    match args.duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down");
        }
    }

    selector.stop_monitoring();

    let history = selector.history().await;
    if !history.is_empty() {
        tracing::info!("{} failover(s) this session:", history.len());
        for event in &history {
            tracing::info!("  {} -> {} ({})", event.from, event.to, event.reason);
        }
    }

    Ok(())
}

/// Executes the `rank` subcommand. Outputs raw JSON to stdout.
fn run_rank(args: RankArgs) -> Result<()> {
    let nodes = load_inventory(&args.inventory)?;
    let weights = args.strategy.preset();
    let ranking = scorer::rank_nodes(&nodes, &weights);

    let entries: Vec<serde_json::Value> = ranking
        .iter()
        .map(|r| {
            let node = &nodes[r.index];
            serde_json::json!({
                "name": node.name,
                "region": node.region,
                "latency_ms": node.latency_ms,
                "reliability": node.reliability,
                "load": node.load,
                "score": r.score,
            })
        })
        .collect();

    println!("{}", serde_json::to_string(&entries)?);
    Ok(())
}
