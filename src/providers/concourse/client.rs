use log::info;
use reqwest::Client;
use url::Url;

use crate::auth::{Credentials, Token};
use crate::error::{RadiatorError, Result};
use crate::providers::http::{build_client, fetch_json, join_segments, parse_base_url};

use super::types::{AuthToken, ConcourseBuild, ConcourseJob, ConcoursePipeline};

/// Thin client over the Concourse v1 REST API for a single team.
pub struct ConcourseClient {
    client: Client,
    base_url: Url,
    team: String,
    credentials: Credentials,
}

impl ConcourseClient {
    pub fn new(base_url: &str, team: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_base_url(base_url)?,
            team: team.to_owned(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn team_url(&self, tail: &[&str]) -> Result<Url> {
        let mut segments = vec!["api", "v1", "teams", self.team.as_str()];
        segments.extend_from_slice(tail);
        join_segments(&self.base_url, &segments)
    }

    /// Swaps basic credentials for a bearer token. Other credentials are left as they are.
    pub async fn login(&mut self) -> Result<()> {
        let Credentials::Basic { .. } = &self.credentials else {
            return Ok(());
        };

        let url = self.team_url(&["auth", "token"])?;
        let token: AuthToken = fetch_json(self.credentials.apply(self.client.get(url))).await?;

        if !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(RadiatorError::Authentication(format!(
                "Unsupported token type: {}",
                token.token_type
            )));
        }

        info!("Logged in to Concourse team {}", self.team);
        self.credentials = Credentials::Bearer(Token::from(token.value));
        Ok(())
    }

    pub async fn fetch_pipelines(&self) -> Result<Vec<ConcoursePipeline>> {
        let url = self.team_url(&["pipelines"])?;
        fetch_json(self.credentials.apply(self.client.get(url))).await
    }

    pub async fn fetch_jobs(&self, pipeline: &str) -> Result<Vec<ConcourseJob>> {
        let url = self.team_url(&["pipelines", pipeline, "jobs"])?;
        fetch_json(self.credentials.apply(self.client.get(url))).await
    }

    /// Build list of a job, newest first.
    pub async fn fetch_builds(&self, pipeline: &str, job: &str) -> Result<Vec<ConcourseBuild>> {
        let url = self.team_url(&["pipelines", pipeline, "jobs", job, "builds"])?;
        fetch_json(self.credentials.apply(self.client.get(url))).await
    }
}
