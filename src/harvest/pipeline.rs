//! Harvest pipeline: category dispatch and envelope production.
//!
//! [`Harvester::fetch`] runs one of two pipelines:
//! - **crates**: Listing walk → Enrichment → Incremental filter → Envelope
//! - **summary**: one summary request → Envelope
//!
//! Both are pull-based streams. Nothing is requested until the stream is
//! polled, and dropping it stops all further requests.

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{HttpTransport, RegistryClient};
use crate::config::{CategoryTokens, HarvesterConfig};
use crate::harvest::enricher::Enricher;
use crate::harvest::filter::keep;
use crate::harvest::walker::ListingWalker;
use crate::model::{Category, Envelope, Payload, Summary};
use crate::traits::{decode, Backend, ConfigError, HarvestError, Transport};

/// Backend identifier stamped on every envelope.
pub const BACKEND_NAME: &str = "Crates";

/// Lazy, finite sequence of envelopes produced by one fetch.
pub type EnvelopeStream<'a> = Pin<Box<dyn Stream<Item = Result<Envelope, HarvestError>> + Send + 'a>>;

// ============================================================================
// Harvester
// ============================================================================

/// Entry point of the harvester.
///
/// Holds no state between fetches besides the client's pacing clock; every
/// fetch walks the registry from scratch.
///
/// # Example
///
/// ```ignore
/// use crates_harvester::{Category, Harvester, HarvesterConfig};
/// use futures::TryStreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let harvester = Harvester::new(HarvesterConfig::default().with_tag("weekly"))?;
///
///     let mut items = harvester.fetch(Category::Crates, None);
///     while let Some(envelope) = items.try_next().await? {
///         println!("{}", serde_json::to_string(&envelope)?);
///     }
///     Ok(())
/// }
/// ```
pub struct Harvester<T = HttpTransport> {
    client: RegistryClient<T>,
    origin: String,
    tag: String,
    categories: CategoryTokens,
    concurrent_enrichment: bool,
}

impl Harvester<HttpTransport> {
    /// Creates a harvester talking HTTP to the configured origin.
    pub fn new(config: HarvesterConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> Harvester<T> {
    /// Creates a harvester on top of any [`Transport`].
    pub fn with_transport(transport: T, config: HarvesterConfig) -> Result<Self, ConfigError> {
        let client = RegistryClient::new(transport, &config)?;

        Ok(Self {
            client,
            tag: config.effective_tag().to_string(),
            origin: config.origin,
            categories: config.layout.categories,
            concurrent_enrichment: config.concurrent_enrichment,
        })
    }

    pub fn client(&self) -> &RegistryClient<T> {
        &self.client
    }

    /// Resolves a category token such as `"crates"` or `"summary"`.
    pub fn category(&self, token: &str) -> Result<Category, ConfigError> {
        self.categories.resolve(token)
    }

    /// Fetches every item of `category`.
    ///
    /// `from_date` drops crates last modified before it; the summary is
    /// always produced. Errors end the stream after every envelope produced
    /// before them has been yielded.
    pub fn fetch(&self, category: Category, from_date: Option<DateTime<Utc>>) -> EnvelopeStream<'_> {
        match category {
            Category::Crates => self.fetch_crates(from_date),
            Category::Summary => self.fetch_summary(from_date),
        }
    }

    fn fetch_crates(&self, from_date: Option<DateTime<Utc>>) -> EnvelopeStream<'_> {
        let walker = ListingWalker::new(&self.client);
        let enricher = Enricher::new(&self.client, self.concurrent_enrichment);

        Box::pin(try_stream! {
            info!(origin = %self.origin, from_date = ?from_date, "Fetching crates");

            let mut pages_walked = 0usize;
            let mut produced = 0usize;
            let mut skipped = 0usize;

            let mut pages = Box::pin(walker.pages());

            while let Some(page) = pages.next().await {
                let page = page?;
                pages_walked += 1;

                for stub in &page.crates {
                    let record = enricher.enrich(stub).await?;

                    if !keep(&record, from_date) {
                        debug!(crate_id = %stub.id, updated_at = %record.updated_at(), "Skipping crate older than from_date");
                        skipped += 1;
                        continue;
                    }

                    produced += 1;
                    yield self.envelope(Category::Crates, record.updated_at(), Payload::Crate(Box::new(record)));
                }
            }

            info!(pages_walked, produced, skipped, "Fetch of crates finished");
        })
    }

    fn fetch_summary(&self, from_date: Option<DateTime<Utc>>) -> EnvelopeStream<'_> {
        Box::pin(try_stream! {
            if from_date.is_some() {
                debug!("Summary is a full snapshot, ignoring from_date");
            }

            let body = self.client.summary().await?;
            let summary: Summary = decode(&body, "summary")?;

            info!(
                num_crates = summary.num_crates,
                num_downloads = summary.num_downloads,
                "Fetched summary"
            );

            yield self.envelope(Category::Summary, Utc::now(), Payload::Summary(summary));
        })
    }

    fn envelope(&self, category: Category, updated_on: DateTime<Utc>, data: Payload) -> Envelope {
        Envelope {
            backend_name: BACKEND_NAME.to_string(),
            backend_version: env!("CARGO_PKG_VERSION").to_string(),
            category: self.categories.token(category).to_string(),
            origin: self.origin.clone(),
            tag: self.tag.clone(),
            uuid: Uuid::new_v4(),
            timestamp: Utc::now(),
            updated_on,
            data,
        }
    }
}

impl<T: Transport> Backend for Harvester<T> {
    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn has_caching() -> bool {
        false
    }

    fn has_resuming() -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
