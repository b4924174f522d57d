//! End-to-end harvests through the public API against canned responses.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crates_harvester::{
    Category, Envelope, HarvestError, Harvester, HarvesterConfig, HttpError, Transport,
};

const ORIGIN: &str = "http://registry.test/";

/// Serves fixture files by URL, recording each request.
#[derive(Default)]
struct FixtureTransport {
    routes: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureTransport {
    fn serve(mut self, path: &str, fixture: &str) -> Self {
        let file = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/data/crates")
            .join(format!("{fixture}.json"));
        let body = fs::read_to_string(&file).expect("fixture file");
        self.routes.insert(format!("{ORIGIN}api/v1/{path}"), body);
        self
    }

    fn registry() -> Self {
        let mut transport = Self::default()
            .serve("summary", "crates_summary")
            .serve("crates?sort=alphabetical&page=1", "crates_page_1")
            .serve("crates?sort=alphabetical&page=2", "crates_page_2")
            .serve("crates?sort=alphabetical&page=3", "crates_page_empty");

        for (n, id) in ["a", "aabb2", "aac", "abc"].iter().enumerate() {
            let n = n + 1;
            transport = transport
                .serve(&format!("crates/{id}"), &format!("crate_example_{n}"))
                .serve(&format!("crates/{id}/owner_user"), &format!("crate_owner_user_{n}"))
                .serve(&format!("crates/{id}/owner_team"), &format!("crate_owner_team_{n}"));
        }
        transport
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, url: &Url) -> Result<String, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());

        self.routes
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| HttpError::Status {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            })
    }
}

fn harvester(transport: FixtureTransport, tag: &str) -> Harvester<FixtureTransport> {
    let config = HarvesterConfig::new(ORIGIN)
        .with_tag(tag)
        .with_sleep_time(Duration::ZERO);
    Harvester::with_transport(transport, config).unwrap()
}

#[tokio::test]
async fn test_crates_feed_as_json() {
    let backend = harvester(FixtureTransport::registry(), "weekly");

    let items: Vec<Envelope> = backend
        .fetch(Category::Crates, None)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(items.len(), 4);

    let json = serde_json::to_value(&items).unwrap();
    let teams: Vec<usize> = (0..4)
        .map(|i| json[i]["data"]["owner_team_data"]["teams"].as_array().unwrap().len())
        .collect();
    let users: Vec<usize> = (0..4)
        .map(|i| json[i]["data"]["owner_user_data"]["users"].as_array().unwrap().len())
        .collect();

    assert_eq!(teams, vec![0, 1, 1, 1]);
    assert_eq!(users, vec![1, 2, 2, 3]);
    assert_eq!(json[0]["category"], "crates");
    assert_eq!(json[0]["tag"], "weekly");
    assert_eq!(json[0]["origin"], ORIGIN);
    assert_eq!(json[3]["data"]["crate"]["id"], "abc");
}

#[tokio::test]
async fn test_from_date_is_an_ordered_subset() {
    let backend = harvester(FixtureTransport::registry(), "");
    let from_date = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();

    let all: Vec<Envelope> = backend
        .fetch(Category::Crates, None)
        .try_collect()
        .await
        .unwrap();
    let recent: Vec<Envelope> = backend
        .fetch(Category::Crates, Some(from_date))
        .try_collect()
        .await
        .unwrap();

    let id = |item: &Envelope| item.data.as_crate().unwrap().id().to_string();
    let expected: Vec<String> = all
        .iter()
        .filter(|item| item.updated_on >= from_date)
        .map(id)
        .collect();

    assert_eq!(recent.iter().map(id).collect::<Vec<_>>(), expected);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].tag, ORIGIN);
}

#[tokio::test]
async fn test_summary_snapshot_round_trips_as_json() {
    let backend = harvester(FixtureTransport::registry(), "stats");
    let from_date = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();

    let items: Vec<Envelope> = backend
        .fetch(Category::Summary, Some(from_date))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    let line = serde_json::to_string(&items[0]).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["category"], "summary");
    assert_eq!(parsed["data"]["num_crates"], 10000);
    assert_eq!(parsed["data"]["num_downloads"], 2000000000u64);
}

#[tokio::test]
async fn test_missing_detail_stops_the_feed() {
    let mut transport = FixtureTransport::registry();
    transport.routes.remove(&format!("{ORIGIN}api/v1/crates/a"));
    let requests = Arc::clone(&transport.requests);
    let backend = harvester(transport, "");

    let result: Result<Vec<Envelope>, HarvestError> =
        backend.fetch(Category::Crates, None).try_collect().await;

    assert!(matches!(result, Err(HarvestError::Enrichment(ref e)) if e.crate_id == "a"));
    // Listing page 1, then the failed detail call; nothing after it
    assert_eq!(requests.lock().unwrap().len(), 2);
}
