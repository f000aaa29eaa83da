use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfo {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("teams service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("teams service returned status {0}")]
    Status(StatusCode),
}

/// Capability for validating and naming team references.
///
/// `program` treats a resolver failure as a hard error because team validity
/// cannot be confirmed; reads never depend on it (team names are
/// denormalized onto the match row at program time). Tests substitute a
/// static in-memory resolver.
#[allow(async_fn_in_trait)]
pub trait TeamResolver: Send + Sync + 'static {
    async fn resolve(&self, team_id: Uuid) -> Result<Option<TeamInfo>, ResolverError>;
}

/// HTTP client against the external teams service.
pub struct HttpTeamsClient {
    base_url: String,
    request_timeout: Duration,
    client: Client,
}

impl HttpTeamsClient {
    pub fn new(base_url: String, request_timeout: Duration) -> Self {
        Self {
            base_url,
            request_timeout,
            client: Client::new(),
        }
    }
}

impl TeamResolver for HttpTeamsClient {
    async fn resolve(&self, team_id: Uuid) -> Result<Option<TeamInfo>, ResolverError> {
        let url = format!("{}/api/teams/{}", self.base_url, team_id);
        tracing::debug!("Resolving team {} via {}", team_id, url);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let team = response.json::<TeamInfo>().await?;
                Ok(Some(team))
            }
            status => {
                tracing::error!("Teams service returned {} for team {}", status, team_id);
                Err(ResolverError::Status(status))
            }
        }
    }
}
