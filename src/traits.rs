use async_trait::async_trait;
use thiserror::Error;
use url::Url;

// ============================================================================
// Transport seam
// ============================================================================

/// Issues a single HTTP GET and returns the response body.
///
/// Implementations must turn every non-success status into
/// [`HttpError::Status`] and every transport timeout into
/// [`HttpError::Timeout`]. Pacing is not their concern; the
/// [`RegistryClient`](crate::client::RegistryClient) paces before calling.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String, HttpError>;
}

/// Capabilities a command runner queries before offering flags.
pub trait Backend {
    /// Returns the backend identifier stamped on every envelope.
    fn backend_name(&self) -> &str;

    fn origin(&self) -> &str;

    fn tag(&self) -> &str;

    /// Whether fetched items can be cached and replayed.
    fn has_caching() -> bool
    where
        Self: Sized;

    /// Whether an interrupted fetch can be resumed from stored state.
    fn has_resuming() -> bool
    where
        Self: Sized;
}

// ============================================================================
// Error Types
// ============================================================================

/// Failure of one outbound request.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The registry answered with a non-success status
    #[error("GET {url} returned HTTP {status}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The transport gave up waiting for a response
    #[error("GET {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or body read failure
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// An endpoint path could not be joined onto the API base
    #[error("Invalid endpoint path '{path}': {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl HttpError {
    /// Status code for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A response body that is not the JSON shape expected for its endpoint.
#[derive(Error, Debug)]
#[error("Failed to decode {context}: {source}")]
pub struct DecodeError {
    pub context: String,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn new(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }
}

/// Decodes `body` as `T`, attributing failures to `context`.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    body: &str,
    context: impl Into<String>,
) -> Result<T, DecodeError> {
    serde_json::from_str(body).map_err(|e| DecodeError::new(context, e))
}

/// Failure of a single request or of decoding its body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Which of the three enrichment sub-calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichStep {
    Detail,
    OwnerUsers,
    OwnerTeams,
}

impl std::fmt::Display for EnrichStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnrichStep::Detail => "crate detail",
            EnrichStep::OwnerUsers => "owner users",
            EnrichStep::OwnerTeams => "owner teams",
        };
        f.write_str(name)
    }
}

/// Enrichment of one crate stub failed; nothing from it is kept.
#[derive(Error, Debug)]
#[error("Enrichment of crate '{crate_id}' failed fetching {step}: {source}")]
pub struct EnrichmentError {
    pub crate_id: String,
    pub step: EnrichStep,
    #[source]
    pub source: FetchError,
}

/// Invalid harvester configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    /// A leading `/` would make the path replace the API root instead of
    /// extending it
    #[error("Endpoint template '{0}' must be relative to the API root")]
    AbsoluteEndpoint(String),

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Invalid date '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Anything a harvest stream can yield instead of an envelope.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<FetchError> for HarvestError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http(e) => HarvestError::Http(e),
            FetchError::Decode(e) => HarvestError::Decode(e),
        }
    }
}
