//! Upstream credentials read from the Qwen OAuth credential file.
//!
//! The file is owned by the Qwen tooling that performs the OAuth login and token
//! refresh. The gateway only reads it, on every request, so a refreshed token is
//! picked up without a restart.

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Endpoint used when the credential file carries no `resource_url`.
pub const DEFAULT_ENDPOINT: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub bearer_token: String,
    pub endpoint_base_url: String,
}

/// Source of upstream credentials, consulted once per forwarded request.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credentials(&self) -> Result<Credential>;
}

#[derive(Debug, Deserialize)]
struct OAuthCredsFile {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    resource_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    expiry_date: Option<i64>,
}

/// Reads `~/.qwen/oauth_creds.json` (or an explicit path) on every call.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    path: PathBuf,
}

impl FileCredentialProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provider for the standard per-user location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(default_credentials_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn get_credentials(&self) -> Result<Credential> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            GatewayError::credential(format!(
                "Failed to read credentials {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let creds: OAuthCredsFile = serde_json::from_str(&content).map_err(|e| {
            GatewayError::credential(format!(
                "Invalid credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let token = creds
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::credential("No access token"))?;

        if let Some(expiry) = creds.expiry_date {
            if expiry < chrono::Utc::now().timestamp_millis() {
                tracing::warn!(
                    path = %self.path.display(),
                    "Access token has expired; run the qwen CLI to refresh it"
                );
            }
        }

        Ok(Credential {
            bearer_token: token,
            endpoint_base_url: normalize_endpoint(creds.resource_url.as_deref()),
        })
    }
}

/// Fixed credentials, for embedding and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider(pub Credential);

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self(Credential {
            bearer_token: token.into(),
            endpoint_base_url: endpoint.into(),
        })
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn get_credentials(&self) -> Result<Credential> {
        Ok(self.0.clone())
    }
}

/// `~/.qwen/oauth_creds.json`
pub fn default_credentials_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".qwen").join("oauth_creds.json"))
        .ok_or_else(|| GatewayError::credential("Could not determine home directory"))
}

fn normalize_endpoint(resource_url: Option<&str>) -> String {
    let url = match resource_url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return DEFAULT_ENDPOINT.to_string(),
    };

    let url = url.trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
