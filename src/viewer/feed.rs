use crate::{
    domain::MemeFeed,
    errors::{FeedError, RESOLVE_FAILED_MESSAGE},
    models::MemeRecord,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing;

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Calls the resolver endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMemeFeed {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpMemeFeed {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn with_defaults(endpoint: impl Into<String>, user_agent: &str) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self::new(http, endpoint))
    }
}

#[async_trait]
impl MemeFeed for HttpMemeFeed {
    async fn fetch(&self) -> Result<MemeRecord, FeedError> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting meme from resolver");
        let resp = self.http.get(&self.endpoint).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<MemeRecord>().await?);
        }

        // The resolver answers failures with {error, details?}; anything else is opaque.
        let bytes = resp.bytes().await?;
        let (error, details) = match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => (body.error, body.details),
            Err(_) => (
                RESOLVE_FAILED_MESSAGE.to_string(),
                Some(String::from_utf8_lossy(&bytes).into_owned()).filter(|s| !s.is_empty()),
            ),
        };
        tracing::warn!(status = status.as_u16(), %error, details = ?details, "Resolver rejected request");
        Err(FeedError::Rejected {
            status: status.as_u16(),
            error,
            details,
        })
    }
}
