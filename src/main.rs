//! release-watch — Binary Entrypoint
//! `list` prints the current calendar so events can be picked by index;
//! `watch` waits for the release, polls until every actual value is out and
//! writes the result file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use release_watch::config::{
    load_config_default, load_config_from, load_feed_settings_default, load_feed_settings_from,
    FeedSettings, WatchConfig,
};
use release_watch::ingest::providers::rss::RssFeed;
use release_watch::{build_catalog, fetch_snapshot, run_watch, Clock, SystemClock};

#[derive(Debug, Parser)]
#[command(name = "release-watch", version, about)]
struct Cli {
    /// Config file (TOML or JSON). Defaults to $RELEASE_WATCH_CONFIG, then config/release_watch.{toml,json}.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the feed snapshot with row indices.
    List {
        /// Feed to list; when given, no config file is read.
        #[arg(long)]
        feed_url: Option<String>,
    },
    /// Wait for the release and capture the actual values.
    Watch,
}

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("release_watch=info,watch=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::List { feed_url } => {
            let settings: FeedSettings = match (feed_url, &cli.config) {
                (Some(url), _) => FeedSettings::new(url),
                (None, Some(p)) => load_feed_settings_from(p)?,
                (None, None) => load_feed_settings_default()?,
            };
            let feed = RssFeed::from_url(settings.feed_url.clone(), settings.http_timeout())?;
            let snapshot = fetch_snapshot(&feed)
                .await
                .with_context(|| format!("fetching snapshot from {}", settings.feed_url))?;
            print!("{}", snapshot.render_table());
        }
        Command::Watch => {
            let cfg: WatchConfig = match &cli.config {
                Some(p) => load_config_from(p)?,
                None => load_config_default()?,
            };

            // The feed owns the http client; it is dropped when main returns, on every path.
            let feed = RssFeed::from_url(cfg.feed_url.clone(), cfg.http_timeout())?;
            let snapshot = fetch_snapshot(&feed)
                .await
                .with_context(|| format!("fetching snapshot from {}", cfg.feed_url))?;

            let catalog = build_catalog(&snapshot, cfg.events.as_slice(), cfg.fields.as_slice())?;
            for ev in catalog.iter() {
                tracing::info!(
                    target: "watch",
                    title = %ev.title,
                    previous = ev.previous.as_deref().unwrap_or_default(),
                    consensus = ev.consensus.as_deref().unwrap_or_default(),
                    invert = ev.invert_statistic,
                    "watching"
                );
            }

            let clock = SystemClock;
            let plan = cfg.release_plan(clock.now().date())?;
            run_watch(
                &feed,
                &clock,
                &catalog,
                &plan,
                &cfg.poll_options(),
                &cfg.output_path,
            )
            .await?;
        }
    }

    Ok(())
}
