//! Registry API client.
//!
//! [`RegistryClient`] knows the registry's endpoint set and paces every
//! request through one [`RequestPacer`]. It returns raw bodies; decoding is
//! left to the harvest stages so failures can be attributed per call.

use async_trait::async_trait;
use futures::Stream;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Endpoints, HarvesterConfig};
use crate::harvest::walker::ListingWalker;
use crate::pacer::RequestPacer;
use crate::traits::{ConfigError, HarvestError, HttpError, Transport};

// ============================================================================
// HTTP Transport
// ============================================================================

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &HarvesterConfig) -> Result<Self, ConfigError> {
        Self::new(&config.user_agent, config.timeout)
    }
}

fn transport_error(url: &Url, source: reqwest::Error) -> HttpError {
    if source.is_timeout() {
        HttpError::Timeout {
            url: url.to_string(),
        }
    } else {
        HttpError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, HttpError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = %url, error = %e, "Failed to read error response body");
                    String::new()
                }
            };
            warn!(url = %url, status = status.as_u16(), "Registry returned an error status");
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

// ============================================================================
// Registry Client
// ============================================================================

/// Client for the registry's fixed endpoint set.
pub struct RegistryClient<T> {
    transport: T,
    api_url: Url,
    endpoints: Endpoints,
    pacer: RequestPacer,
}

impl RegistryClient<HttpTransport> {
    /// Builds a client talking HTTP to the configured origin.
    pub fn from_config(config: &HarvesterConfig) -> Result<Self, ConfigError> {
        Self::new(HttpTransport::from_config(config)?, config)
    }
}

impl<T: Transport> RegistryClient<T> {
    pub fn new(transport: T, config: &HarvesterConfig) -> Result<Self, ConfigError> {
        config.layout.endpoints.validate()?;

        Ok(Self {
            transport,
            api_url: config.api_url()?,
            endpoints: config.layout.endpoints.clone(),
            pacer: RequestPacer::new(config.sleep_time),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Fetches the aggregate statistics snapshot.
    pub async fn summary(&self) -> Result<String, HttpError> {
        let url = self.endpoint(&self.endpoints.summary)?;
        self.get(url).await
    }

    /// Fetches one listing page, counting from 1.
    pub async fn crates_page(&self, page: u32) -> Result<String, HttpError> {
        let mut url = self.endpoint(&self.endpoints.crates)?;
        url.query_pairs_mut()
            .append_pair("sort", "alphabetical")
            .append_pair("page", &page.to_string());
        self.get(url).await
    }

    /// Lazily walks every non-empty listing page, yielding raw bodies.
    pub fn crates(&self) -> impl Stream<Item = Result<String, HarvestError>> + Send + '_ {
        ListingWalker::new(self).raw_pages()
    }

    /// Fetches the detail document of one crate.
    pub async fn crate_detail(&self, id: &str) -> Result<String, HttpError> {
        let url = self.endpoint(&Endpoints::expand(&self.endpoints.crate_detail, id))?;
        self.get(url).await
    }

    /// Fetches the users owning a crate.
    pub async fn owners_users(&self, id: &str) -> Result<String, HttpError> {
        let url = self.endpoint(&Endpoints::expand(&self.endpoints.owner_user, id))?;
        self.get(url).await
    }

    /// Fetches the teams owning a crate.
    pub async fn owners_teams(&self, id: &str) -> Result<String, HttpError> {
        let url = self.endpoint(&Endpoints::expand(&self.endpoints.owner_team, id))?;
        self.get(url).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpError> {
        self.api_url
            .join(path)
            .map_err(|source| HttpError::InvalidUrl {
                path: path.to_string(),
                source,
            })
    }

    async fn get(&self, url: Url) -> Result<String, HttpError> {
        self.pacer.pace().await;
        debug!(url = %url, "GET");
        self.transport.get(&url).await
    }
}
