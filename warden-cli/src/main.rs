//! Warden CLI
//!
//! Operational driver for the threat signal engine: refresh feeds, classify
//! URLs/files/emails, and query the flagged-website graph.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use warden_core::{SiteActionKind, WardenConfig};
use warden_engine::{GraphService, HistoryStore, MemoryHistoryStore, ScoringEngine};
use warden_feeds::FeedCache;
use warden_store::{Neo4jGraphStore, SqliteHistoryStore};

#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about = "Warden: threat signal aggregation and classification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML); defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh all enabled threat feeds
    Refresh,

    /// Classify a URL against the cached feeds
    Url {
        /// The URL to classify
        url: String,
    },

    /// Classify a downloaded file name
    File {
        /// The file name to classify
        file: String,

        /// Origin URL of the download, if known
        #[arg(long)]
        origin: Option<String>,
    },

    /// Assess an email body for phishing indicators
    Email {
        /// Read the body from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Build website nodes in the graph from cached domain feeds
    Materialize,

    /// Top flagged sites by risk score
    Hotspots {
        /// Number of rows to return
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Flagged-relation tuples for the dashboard graph
    Relations,

    /// Record a user report for a site
    Report {
        url: String,

        #[arg(long, default_value = "")]
        details: String,
    },

    /// Record a user override of a warning
    Override {
        url: String,

        #[arg(long, default_value = "")]
        details: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let config = match &cli.config {
        Some(path) => WardenConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WardenConfig::default(),
    };

    let feeds = Arc::new(FeedCache::new(&config).context("opening feed cache")?);

    match cli.command {
        Commands::Refresh => {
            let result = feeds.refresh().await;
            for outcome in &result.outcomes {
                println!(
                    "{:<20} {:?} ({} indicators)",
                    outcome.feed, outcome.status, outcome.indicator_count
                );
            }
            if result.stale() > 0 {
                println!("{} feed(s) stale, serving last-known-good", result.stale());
            }
        }

        Commands::Url { url } => {
            let engine = ScoringEngine::new(feeds, history_store(&config)?);
            let verdict = engine.classify_url(&url).await;
            println!("{} -> {} ({})", verdict.subject, verdict.level.label(), verdict.reason());
        }

        Commands::File { file, origin } => {
            let engine = ScoringEngine::new(feeds, history_store(&config)?);
            let verdict = engine.classify_file(&file, origin.as_deref()).await;
            println!("{} -> {} ({})", verdict.subject, verdict.level.label(), verdict.reason());
        }

        Commands::Email { file } => {
            let body = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading email body from stdin")?;
                    buf
                }
            };
            let engine = ScoringEngine::new(feeds, history_store(&config)?);
            let assessment = engine.assess_email(&body);
            println!(
                "{} (score {}, {})",
                if assessment.phishing { "PHISHING" } else { "NOT PHISHING" },
                assessment.score,
                assessment.confidence.as_str()
            );
            println!("reasons: {}", assessment.reason());
        }

        Commands::Materialize => {
            let service = graph_service(&config, feeds).await?;
            let upserted = service.materialize_from_feeds().await;
            println!("{upserted} website node(s) upserted");
        }

        Commands::Hotspots { top } => {
            let service = graph_service(&config, feeds).await?;
            let hotspots = service.hotspots(top).await;
            for h in &hotspots {
                println!("{:>3}  {:<12} {}", h.risk_score, h.label, h.url);
            }
            if hotspots.is_empty() {
                println!("no flagged sites");
            }
        }

        Commands::Relations => {
            let service = graph_service(&config, feeds).await?;
            for relation in service.relations().await {
                println!("{}", serde_json::to_string(&relation)?);
            }
        }

        Commands::Report { url, details } => {
            let engine = ScoringEngine::new(feeds, history_store(&config)?);
            engine
                .record_action(&url, SiteActionKind::Report, &details)
                .await
                .context("recording report")?;
            println!("reported {url}");
        }

        Commands::Override { url, details } => {
            let engine = ScoringEngine::new(feeds, history_store(&config)?);
            engine
                .record_action(&url, SiteActionKind::Override, &details)
                .await
                .context("recording override")?;
            println!("override recorded for {url}");
        }
    }

    Ok(())
}

/// History store from config: SQLite when a path is set, otherwise an
/// in-memory fallback so classification still works without a database.
fn history_store(config: &WardenConfig) -> Result<Arc<dyn HistoryStore>> {
    match &config.sqlite_path {
        Some(path) => Ok(Arc::new(SqliteHistoryStore::open(path)?)),
        None => {
            tracing::warn!("no sqlite_path configured, verdict history is in-memory only");
            Ok(Arc::new(MemoryHistoryStore::default()))
        }
    }
}

/// Graph service from config; graph commands require a Neo4j endpoint.
async fn graph_service(config: &WardenConfig, feeds: Arc<FeedCache>) -> Result<GraphService> {
    let Some(neo4j) = &config.neo4j else {
        bail!("graph commands need a [neo4j] section in the config file");
    };
    let store = Neo4jGraphStore::connect(neo4j).await?;
    Ok(GraphService::new(feeds, Arc::new(store)))
}
