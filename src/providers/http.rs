use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{RadiatorError, Result};

pub(super) fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ciradiator/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RadiatorError::Config(format!("Failed to create HTTP client: {e}")))
}

pub(super) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url =
        Url::parse(base_url).map_err(|e| RadiatorError::Config(format!("Invalid base URL: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RadiatorError::Config(format!(
            "Invalid base URL: {base_url} cannot carry a path"
        )));
    }
    Ok(url)
}

/// Appends path segments to a base URL, percent-encoding each one.
pub(super) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RadiatorError::Config(format!("Invalid base URL: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends a request and decodes the JSON body.
///
/// Rejected credentials (401/403) surface as [`RadiatorError::Authentication`],
/// other non-success statuses as [`RadiatorError::Api`]. Nothing is retried.
pub(super) async fn fetch_json<T>(request: RequestBuilder) -> Result<T>
where
    T: DeserializeOwned,
{
    let response = request.send().await?;
    let status = response.status();
    debug!("{} {}", status.as_u16(), response.url());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RadiatorError::Authentication("Authorization Error".to_string()));
    }

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(RadiatorError::Api {
            status: status.as_u16(),
            message: error_text,
        });
    }

    Ok(response.json().await?)
}
