//! Harvester configuration.
//!
//! The registry's endpoint templates and category tokens are data here
//! rather than literals in the pipeline, so tests can point a harvester at
//! any layout served by a mock transport.

use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use url::Url;

use crate::model::Category;
use crate::traits::ConfigError;

/// Default registry base endpoint.
pub const DEFAULT_ORIGIN: &str = "https://crates.io/";

/// API root, relative to the origin.
pub const DEFAULT_API_PATH: &str = "api/v1/";

/// Default pause between two outbound requests.
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(1);

/// Default per-request transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// crates.io refuses requests without an identifying User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "crates-harvester/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/Nertonm/crates-harvester)"
);

/// Placeholder substituted with the crate identifier in endpoint templates.
const ID_PLACEHOLDER: &str = "{id}";

// ============================================================================
// Registry Layout
// ============================================================================

/// Endpoint path templates, relative to the API root.
///
/// Templates are joined onto the API root URL, so they must not start with
/// `/`; [`Endpoints::validate`] rejects those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub summary: String,
    pub crates: String,
    pub crate_detail: String,
    pub owner_user: String,
    pub owner_team: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            summary: "summary".to_string(),
            crates: "crates".to_string(),
            crate_detail: "crates/{id}".to_string(),
            owner_user: "crates/{id}/owner_user".to_string(),
            owner_team: "crates/{id}/owner_team".to_string(),
        }
    }
}

impl Endpoints {
    /// Fills the `{id}` placeholder of `template`.
    pub fn expand(template: &str, id: &str) -> String {
        template.replace(ID_PLACEHOLDER, id)
    }

    /// Checks that every template stays under the API root.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let templates = [
            &self.summary,
            &self.crates,
            &self.crate_detail,
            &self.owner_user,
            &self.owner_team,
        ];

        match templates.iter().find(|template| template.starts_with('/')) {
            Some(template) => Err(ConfigError::AbsoluteEndpoint(template.to_string())),
            None => Ok(()),
        }
    }
}

/// Tokens naming each [`Category`] on the wire and on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTokens {
    pub crates: String,
    pub summary: String,
}

impl Default for CategoryTokens {
    fn default() -> Self {
        Self {
            crates: "crates".to_string(),
            summary: "summary".to_string(),
        }
    }
}

impl CategoryTokens {
    pub fn token(&self, category: Category) -> &str {
        match category {
            Category::Crates => &self.crates,
            Category::Summary => &self.summary,
        }
    }

    /// Maps a token back to its category.
    pub fn resolve(&self, token: &str) -> Result<Category, ConfigError> {
        if token == self.crates {
            Ok(Category::Crates)
        } else if token == self.summary {
            Ok(Category::Summary)
        } else {
            Err(ConfigError::UnknownCategory(token.to_string()))
        }
    }
}

/// Static description of the registry API the harvester talks to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryLayout {
    pub endpoints: Endpoints,
    pub categories: CategoryTokens,
}

// ============================================================================
// Harvester Config
// ============================================================================

/// Everything needed to construct a [`Harvester`](crate::harvest::Harvester).
///
/// # Example
///
/// ```ignore
/// let config = HarvesterConfig::new("https://crates.io/")
///     .with_tag("rust-ecosystem")
///     .with_sleep_time(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// Registry base endpoint, kept verbatim for envelopes
    pub origin: String,

    /// API root relative to the origin
    pub api_path: String,

    /// Label for envelopes; falls back to the origin when empty
    pub tag: Option<String>,

    /// Minimum pause between consecutive requests
    pub sleep_time: Duration,

    /// Per-request transport timeout
    pub timeout: Duration,

    pub user_agent: String,

    /// Issue the three enrichment calls of a crate concurrently
    pub concurrent_enrichment: bool,

    pub layout: RegistryLayout,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl HarvesterConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            api_path: DEFAULT_API_PATH.to_string(),
            tag: None,
            sleep_time: DEFAULT_SLEEP_TIME,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrent_enrichment: false,
            layout: RegistryLayout::default(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    pub fn with_sleep_time(mut self, sleep_time: Duration) -> Self {
        self.sleep_time = sleep_time;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_concurrent_enrichment(mut self, concurrent: bool) -> Self {
        self.concurrent_enrichment = concurrent;
        self
    }

    pub fn with_layout(mut self, layout: RegistryLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The tag envelopes carry: the configured tag, or the origin when the
    /// tag is absent or empty.
    pub fn effective_tag(&self) -> &str {
        match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => tag,
            _ => &self.origin,
        }
    }

    /// Resolves the API root URL every endpoint is joined onto.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let invalid = |source| ConfigError::InvalidOrigin {
            origin: self.origin.clone(),
            source,
        };

        let base = Url::parse(&with_trailing_slash(&self.origin)).map_err(invalid)?;
        base.join(&with_trailing_slash(&self.api_path))
            .map_err(invalid)
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Parses a checkpoint given either as RFC 3339 or as a bare date.
///
/// Bare dates mean midnight UTC.
pub fn parse_from_date(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::InvalidDate(value.to_string()))
}
