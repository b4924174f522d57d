//! Per-crate enrichment: detail plus both owner collections.

use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, instrument};

use crate::client::RegistryClient;
use crate::model::{CrateDetail, CrateRecord, CrateStub, OwnerTeams, OwnerUsers};
use crate::traits::{decode, EnrichStep, EnrichmentError, FetchError, HttpError, Transport};

/// Turns a [`CrateStub`] into a full [`CrateRecord`].
///
/// Each stub costs three requests. By default they are issued one after
/// the other; with `concurrent` set they are joined, still spaced by the
/// client's pacer. Enrichment is all-or-nothing: the first failing call
/// discards whatever the other calls returned.
pub struct Enricher<'a, T> {
    client: &'a RegistryClient<T>,
    concurrent: bool,
}

impl<'a, T: Transport> Enricher<'a, T> {
    pub fn new(client: &'a RegistryClient<T>, concurrent: bool) -> Self {
        Self { client, concurrent }
    }

    #[instrument(skip(self, stub), fields(crate_id = %stub.id))]
    pub async fn enrich(&self, stub: &CrateStub) -> Result<CrateRecord, EnrichmentError> {
        let id = stub.id.as_str();

        let (detail, owner_user_data, owner_team_data) = if self.concurrent {
            tokio::try_join!(self.detail(id), self.owner_users(id), self.owner_teams(id))?
        } else {
            (
                self.detail(id).await?,
                self.owner_users(id).await?,
                self.owner_teams(id).await?,
            )
        };

        debug!(
            users = owner_user_data.users.len(),
            teams = owner_team_data.teams.len(),
            "Crate enriched"
        );

        Ok(CrateRecord {
            detail,
            owner_user_data,
            owner_team_data,
        })
    }

    async fn detail(&self, id: &str) -> Result<CrateDetail, EnrichmentError> {
        fetch_step(id, EnrichStep::Detail, self.client.crate_detail(id)).await
    }

    async fn owner_users(&self, id: &str) -> Result<OwnerUsers, EnrichmentError> {
        fetch_step(id, EnrichStep::OwnerUsers, self.client.owners_users(id)).await
    }

    async fn owner_teams(&self, id: &str) -> Result<OwnerTeams, EnrichmentError> {
        fetch_step(id, EnrichStep::OwnerTeams, self.client.owners_teams(id)).await
    }
}

/// Runs one sub-call and decodes its body, attributing failures to `step`.
async fn fetch_step<R, F>(id: &str, step: EnrichStep, request: F) -> Result<R, EnrichmentError>
where
    R: DeserializeOwned,
    F: Future<Output = Result<String, HttpError>>,
{
    let fail = |source: FetchError| EnrichmentError {
        crate_id: id.to_string(),
        step,
        source,
    };

    let body = request.await.map_err(|e| fail(e.into()))?;
    decode(&body, format!("{step} of crate '{id}'")).map_err(|e| fail(e.into()))
}
