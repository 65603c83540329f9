use crate::error::{GatewayError, Result};

use bytes::Bytes;
use reqwest::Method;
use std::time::Duration;

/// Status and raw body of an upstream reply, relayed to the caller unchanged.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs authenticated calls against the upstream. No retries.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Send `method url` with a bearer token and, if given, a JSON body.
    ///
    /// # Errors
    /// Returns `GatewayError::Upstream` if the upstream cannot be reached or its
    /// body cannot be read. HTTP error statuses are not errors here.
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<UpstreamResponse> {
        let mut req = self
            .client
            .request(method.clone(), url)
            .header("Authorization", format!("Bearer {token}"));

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::upstream(format!("{method} {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::upstream(format!("Failed to read response body: {e}")))?;

        tracing::debug!(%method, url, status, body_len = body.len(), "Upstream response");

        Ok(UpstreamResponse { status, body })
    }
}

/// Append `segments` to the credential endpoint, percent-encoding each one so
/// that `/`, `?` or `#` inside a segment cannot change the target path.
///
/// # Errors
/// Returns `GatewayError::Credential` when the endpoint is not a usable base URL.
pub fn upstream_url(endpoint: &str, segments: &[&str]) -> Result<String> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| GatewayError::credential(format!("Invalid endpoint {endpoint}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GatewayError::credential(format!("Invalid endpoint {endpoint}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}
