// Search index checker

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{ping_with_factory, ClientFactory, Ping, StatusCheck, StatusReport};

/// Pings a search client built by the factory on every check
pub struct SearchChecker {
    factory: ClientFactory,
}

impl SearchChecker {
    pub fn new(factory: ClientFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl StatusCheck for SearchChecker {
    async fn check(&self) -> StatusReport {
        match ping_with_factory(&self.factory).await {
            Ok(true) => StatusReport::message(StatusCode::OK, "Ok"),
            Ok(false) => {
                StatusReport::message(StatusCode::SERVICE_UNAVAILABLE, "ES is not available")
            }
            Err(e) => {
                tracing::warn!("Search index check failed: {}", e);
                StatusReport::message(StatusCode::SERVICE_UNAVAILABLE, "ES is not available")
            }
        }
    }
}

/// Elasticsearch adapter: `HEAD /` answers 200 when the cluster is up
pub struct ElasticsearchPing {
    client: Client,
    url: String,
}

impl ElasticsearchPing {
    /// Accepts `host:port` as well as full URLs
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };

        Ok(Self { client, url })
    }

    pub fn factory(url: impl Into<String>) -> ClientFactory {
        let url = url.into();
        Arc::new(move || -> anyhow::Result<Box<dyn Ping>> {
            Ok(Box::new(ElasticsearchPing::new(&url)?))
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Ping for ElasticsearchPing {
    async fn ping(&self) -> anyhow::Result<bool> {
        let response = self.client.head(&self.url).send().await?;
        Ok(response.status().is_success())
    }
}
