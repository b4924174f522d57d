//! # crates-harvester
//!
//! Harvests crates.io and prints one JSON envelope per line on stdout.
//! Logs go to stderr; set `RUST_LOG` to change verbosity.
//!
//! ```bash
//! # Every crate modified since the start of 2016, one request per second
//! crates-harvester --from-date 2016-01-01 --sleep-time 1
//!
//! # Registry-wide statistics
//! crates-harvester --category summary --tag weekly
//! ```

use clap::Parser;
use futures::TryStreamExt;
use std::io::Write;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crates_harvester::config::{DEFAULT_ORIGIN, DEFAULT_SLEEP_TIME, DEFAULT_TIMEOUT};
use crates_harvester::{parse_from_date, Backend, Harvester, HarvesterConfig, HttpTransport};

/// Harvest crate metadata and ownership from a crates.io-compatible registry.
#[derive(Parser, Debug)]
#[command(name = "crates-harvester", version)]
struct Args {
    /// Registry base endpoint
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Label attached to every item; defaults to the origin
    #[arg(long)]
    tag: Option<String>,

    /// Skip crates modified before this date (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    from_date: Option<String>,

    /// Category to fetch: `crates` or `summary`
    #[arg(long, default_value = "crates")]
    category: String,

    /// Seconds to wait between two requests
    #[arg(long, default_value_t = DEFAULT_SLEEP_TIME.as_secs())]
    sleep_time: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Fetch detail and owners of each crate concurrently
    #[arg(long)]
    concurrent_enrichment: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crates_harvester=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = HarvesterConfig::new(args.origin)
        .with_sleep_time(Duration::from_secs(args.sleep_time))
        .with_timeout(Duration::from_secs(args.timeout))
        .with_concurrent_enrichment(args.concurrent_enrichment);
    if let Some(tag) = args.tag {
        config = config.with_tag(tag);
    }

    let from_date = args.from_date.as_deref().map(parse_from_date).transpose()?;

    let harvester = Harvester::new(config)?;
    let category = harvester.category(&args.category)?;

    info!(
        backend = harvester.backend_name(),
        origin = harvester.origin(),
        tag = harvester.tag(),
        caching = Harvester::<HttpTransport>::has_caching(),
        resuming = Harvester::<HttpTransport>::has_resuming(),
        "Starting harvest"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut items = harvester.fetch(category, from_date);
    let mut count = 0usize;

    while let Some(envelope) = items.try_next().await? {
        serde_json::to_writer(&mut out, &envelope)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;

    info!(count, "Harvest complete");
    Ok(())
}
