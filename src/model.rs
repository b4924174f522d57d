//! Typed records exchanged with the registry and emitted by the harvester.
//!
//! Registry payloads are decoded into named structs where the harvester
//! relies on a field (identifiers, timestamps, owner lists) and keep every
//! other field in a flattened map, so serializing a record back out loses
//! nothing the registry sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ============================================================================
// Listing
// ============================================================================

/// One decoded page of the crate listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPage {
    /// Crate stubs on this page, in registry order
    pub crates: Vec<CrateStub>,

    /// Listing metadata; only used for progress logging
    #[serde(default)]
    pub meta: Option<ListingMeta>,
}

/// Metadata block attached to every listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingMeta {
    /// Total number of crates the registry reports
    pub total: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal identity of a crate as it appears on a listing page.
///
/// The listing carries far more than this, but only the identifier is
/// needed to drive enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateStub {
    /// Unique crate identifier (equal to the crate name on crates.io)
    pub id: String,

    pub name: Option<String>,
}

// ============================================================================
// Crate detail and owners
// ============================================================================

/// Body of `GET /crates/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateDetail {
    #[serde(rename = "crate")]
    pub krate: CrateData,

    /// Published versions, passed through untouched
    #[serde(default)]
    pub versions: Vec<Value>,

    /// Keywords, categories and anything else the registry adds
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `crate` object of a detail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateData {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub documentation: Option<String>,
    pub repository: Option<String>,

    /// Total download count
    #[serde(default)]
    pub downloads: u64,

    pub recent_downloads: Option<u64>,
    pub max_version: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Modification time used for incremental filtering
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user or team owning a crate.
///
/// Both owner endpoints describe their entries with the same shape; `kind`
/// tells them apart (`"user"` or `"team"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: u64,
    pub login: String,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub avatar: Option<String>,
}

/// Body of `GET /crates/{id}/owner_user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerUsers {
    pub users: Vec<Owner>,
}

/// Body of `GET /crates/{id}/owner_team`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerTeams {
    pub teams: Vec<Owner>,
}

/// A crate detail merged with both owner collections.
///
/// Serializes as the whole `GET /crates/{id}` body, unchanged, plus two
/// keys `owner_user_data` and `owner_team_data`. The crate's own fields stay
/// nested under `crate` (`data.crate.id`, `data.crate.updated_at`), and the
/// top-level `versions`, `keywords` and `categories` of the detail body are
/// kept next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrateRecord {
    #[serde(flatten)]
    pub detail: CrateDetail,

    pub owner_user_data: OwnerUsers,

    pub owner_team_data: OwnerTeams,
}

impl CrateRecord {
    pub fn id(&self) -> &str {
        &self.detail.krate.id
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.detail.krate.updated_at
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Body of `GET /summary`: registry-wide aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub num_crates: u64,
    pub num_downloads: u64,

    /// Highlight lists (`new_crates`, `most_downloaded`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Envelope
// ============================================================================

/// The two kinds of items a harvest can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Every crate in the listing, enriched with owners
    Crates,

    /// One aggregate statistics snapshot
    Summary,
}

/// Payload carried by an [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Crate(Box<CrateRecord>),
    Summary(Summary),
}

impl Payload {
    pub fn as_crate(&self) -> Option<&CrateRecord> {
        match self {
            Payload::Crate(record) => Some(&**record),
            Payload::Summary(_) => None,
        }
    }

    pub fn as_summary(&self) -> Option<&Summary> {
        match self {
            Payload::Summary(summary) => Some(summary),
            Payload::Crate(_) => None,
        }
    }
}

/// Uniform wrapper around every item the harvester yields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Name of the backend that produced the item
    pub backend_name: String,

    /// Version of the harvester that produced the item
    pub backend_version: String,

    /// Category token (`"crates"` or `"summary"` by default)
    pub category: String,

    /// Registry base endpoint the item came from
    pub origin: String,

    /// Caller-supplied label; never empty
    pub tag: String,

    /// Fresh identifier for this envelope
    pub uuid: Uuid,

    /// When the item was harvested
    pub timestamp: DateTime<Utc>,

    /// When the item was last modified in the registry
    pub updated_on: DateTime<Utc>,

    pub data: Payload,
}
