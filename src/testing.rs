//! Test-only transport serving canned registry responses.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::config::{Endpoints, HarvesterConfig};
use crate::traits::{HttpError, Transport};

pub const API_URL: &str = "https://crates.io/api/v1/";

pub const CRATE_IDS: [&str; 4] = ["a", "aabb2", "aac", "abc"];

const SUMMARY: &str = include_str!("../tests/data/crates/crates_summary.json");
const PAGE_1: &str = include_str!("../tests/data/crates/crates_page_1.json");
const PAGE_2: &str = include_str!("../tests/data/crates/crates_page_2.json");
const PAGE_EMPTY: &str = include_str!("../tests/data/crates/crates_page_empty.json");

const DETAILS: [&str; 4] = [
    include_str!("../tests/data/crates/crate_example_1.json"),
    include_str!("../tests/data/crates/crate_example_2.json"),
    include_str!("../tests/data/crates/crate_example_3.json"),
    include_str!("../tests/data/crates/crate_example_4.json"),
];

const OWNER_USERS: [&str; 4] = [
    include_str!("../tests/data/crates/crate_owner_user_1.json"),
    include_str!("../tests/data/crates/crate_owner_user_2.json"),
    include_str!("../tests/data/crates/crate_owner_user_3.json"),
    include_str!("../tests/data/crates/crate_owner_user_4.json"),
];

const OWNER_TEAMS: [&str; 4] = [
    include_str!("../tests/data/crates/crate_owner_team_1.json"),
    include_str!("../tests/data/crates/crate_owner_team_2.json"),
    include_str!("../tests/data/crates/crate_owner_team_3.json"),
    include_str!("../tests/data/crates/crate_owner_team_4.json"),
];

/// Serves bodies by exact URL and records every URL requested.
///
/// Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: HashMap<String, (u16, String)>,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl MockTransport {
    pub fn route(mut self, path: &str, body: &str) -> Self {
        self.routes
            .insert(format!("{API_URL}{path}"), (200, body.to_string()));
        self
    }

    pub fn route_status(mut self, path: &str, status: u16) -> Self {
        self.routes
            .insert(format!("{API_URL}{path}"), (status, String::new()));
        self
    }

    pub fn without(mut self, path: &str) -> Self {
        self.routes.remove(&format!("{API_URL}{path}"));
        self
    }

    /// Handle on the request log that stays valid after the transport moves.
    pub fn request_log(&self) -> Arc<Mutex<Vec<Url>>> {
        Arc::clone(&self.requests)
    }

    /// The four-crate registry: two listing pages, then an empty one.
    pub fn crates_io() -> Self {
        Self::registry(&Endpoints::default())
    }

    /// The four-crate registry served under the given endpoint templates.
    pub fn registry(endpoints: &Endpoints) -> Self {
        let listing = |page: u32| format!("{}?sort=alphabetical&page={page}", endpoints.crates);

        let mut transport = Self::default()
            .route(&endpoints.summary, SUMMARY)
            .route(&listing(1), PAGE_1)
            .route(&listing(2), PAGE_2)
            .route(&listing(3), PAGE_EMPTY);

        for (i, id) in CRATE_IDS.iter().enumerate() {
            transport = transport
                .route(&Endpoints::expand(&endpoints.crate_detail, id), DETAILS[i])
                .route(&Endpoints::expand(&endpoints.owner_user, id), OWNER_USERS[i])
                .route(&Endpoints::expand(&endpoints.owner_team, id), OWNER_TEAMS[i]);
        }
        transport
    }

    /// A registry whose very first listing page is empty.
    pub fn empty_catalog() -> Self {
        Self::default()
            .route("summary", SUMMARY)
            .route("crates?sort=alphabetical&page=1", PAGE_EMPTY)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<String, HttpError> {
        self.requests.lock().unwrap().push(url.clone());

        match self.routes.get(url.as_str()) {
            Some((200, body)) => Ok(body.clone()),
            Some((status, body)) => Err(HttpError::Status {
                url: url.to_string(),
                status: *status,
                body: body.clone(),
            }),
            None => Err(HttpError::Status {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Default config with pacing disabled.
pub fn config() -> HarvesterConfig {
    HarvesterConfig::default().with_sleep_time(Duration::ZERO)
}

/// Paths (with query) of the logged requests, relative to the API root.
pub fn requested_paths(log: &Arc<Mutex<Vec<Url>>>) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .map(|url| url.as_str().trim_start_matches(API_URL).to_string())
        .collect()
}
