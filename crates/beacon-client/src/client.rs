//! HTTP client for the discovery daemon

use crate::error::{ClientError, Result};
use beacon_registry::{BroadcastInfo, RegisterBroadcast};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the `/broadcasts` API
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DiscoveryClient {
    /// Create a client for the daemon at `base_url`, e.g. `http://127.0.0.1:5000`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Register or heartbeat a broadcaster
    pub async fn register(&self, broadcaster_id: &str, stream_url: &str) -> Result<BroadcastInfo> {
        let response = self
            .http
            .post(self.endpoint(&["broadcasts"])?)
            .json(&RegisterBroadcast::new(broadcaster_id, stream_url))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Remove a broadcaster; unknown ids yield [`ClientError::NotFound`]
    pub async fn deregister(&self, broadcaster_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(&["broadcasts", broadcaster_id])?)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Every broadcaster the daemon currently lists
    pub async fn list(&self) -> Result<Vec<BroadcastInfo>> {
        let response = self
            .http
            .get(self.endpoint(&["broadcasts"])?)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Find a broadcaster by id in the directory listing
    pub async fn find(&self, broadcaster_id: &str) -> Result<Option<BroadcastInfo>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|b| b.broadcaster_id == broadcaster_id))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Pass successful responses through; turn the rest into errors
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(message))
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let client = DiscoveryClient::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            client.endpoint(&["broadcasts"]).unwrap().as_str(),
            "http://127.0.0.1:5000/broadcasts"
        );

        let client = DiscoveryClient::new("http://discovery.local/beacon/").unwrap();
        assert_eq!(
            client.endpoint(&["broadcasts", "live from/toronto"]).unwrap().as_str(),
            "http://discovery.local/beacon/broadcasts/live%20from%2Ftoronto"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            DiscoveryClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            DiscoveryClient::new("mailto:ops@example.com"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }
}
