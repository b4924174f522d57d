//! Page-by-page traversal of the crate listing.

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use tracing::debug;

use crate::client::RegistryClient;
use crate::model::ListingPage;
use crate::traits::{decode, HarvestError, Transport};

/// One non-empty listing page, kept with its raw body.
struct WalkedPage {
    body: String,
    listing: ListingPage,
}

/// Walks the listing endpoint from page 1 until the first empty page.
///
/// The registry's `meta.total` is never trusted for termination; an empty
/// page is the only stop signal. Each call to [`pages`](Self::pages) or
/// [`raw_pages`](Self::raw_pages) starts a fresh walk, and nothing is
/// requested until the returned stream is polled.
pub struct ListingWalker<'a, T> {
    client: &'a RegistryClient<T>,
}

impl<'a, T: Transport> ListingWalker<'a, T> {
    pub fn new(client: &'a RegistryClient<T>) -> Self {
        Self { client }
    }

    /// Decoded pages, in page order.
    pub fn pages(&self) -> impl Stream<Item = Result<ListingPage, HarvestError>> + Send + 'a {
        self.walk().map_ok(|page| page.listing)
    }

    /// Raw page bodies, in page order.
    pub fn raw_pages(&self) -> impl Stream<Item = Result<String, HarvestError>> + Send + 'a {
        self.walk().map_ok(|page| page.body)
    }

    fn walk(&self) -> impl Stream<Item = Result<WalkedPage, HarvestError>> + Send + 'a {
        let client = self.client;

        try_stream! {
            let mut number: u32 = 1;

            loop {
                let body = client.crates_page(number).await?;
                let listing: ListingPage = decode(&body, format!("listing page {number}"))?;

                if listing.crates.is_empty() {
                    debug!(page = number, "Empty listing page, pagination finished");
                    break;
                }

                debug!(
                    page = number,
                    crates = listing.crates.len(),
                    total = ?listing.meta.as_ref().and_then(|meta| meta.total),
                    "Fetched listing page"
                );

                yield WalkedPage { body, listing };
                number += 1;
            }
        }
    }
}
