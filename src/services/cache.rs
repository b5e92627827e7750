// Key-value cache checker

use async_trait::async_trait;
use http::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use super::{ping_with_factory, ClientFactory, Ping, StatusCheck, StatusReport};

/// Pings a cache client built by the factory on every check.
///
/// The failure wording is fixed whatever backend the factory produces.
pub struct CacheChecker {
    factory: ClientFactory,
}

impl CacheChecker {
    pub fn new(factory: ClientFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl StatusCheck for CacheChecker {
    async fn check(&self) -> StatusReport {
        match ping_with_factory(&self.factory).await {
            Ok(true) => StatusReport::message(StatusCode::OK, "Ok"),
            Ok(false) => {
                tracing::warn!("Cache ping returned a negative answer");
                StatusReport::message(StatusCode::SERVICE_UNAVAILABLE, "Redis is not available")
            }
            Err(e) => {
                tracing::warn!("Cache check failed: {}", e);
                StatusReport::message(StatusCode::SERVICE_UNAVAILABLE, "Redis is not available")
            }
        }
    }
}

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Redis adapter: opens a connection and expects `PONG`
pub struct RedisPing {
    client: redis::Client,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisPing {
    pub fn new(client: redis::Client) -> Self {
        Self::with_timeouts(client, CONNECT_TIMEOUT, RESPONSE_TIMEOUT)
    }

    pub fn with_timeouts(
        client: redis::Client,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Self {
        Self {
            client,
            connect_timeout,
            response_timeout,
        }
    }

    /// Factory opening a fresh client for `url` on every check
    pub fn factory(url: impl Into<String>) -> ClientFactory {
        Self::factory_with_timeouts(url, CONNECT_TIMEOUT, RESPONSE_TIMEOUT)
    }

    pub fn factory_with_timeouts(
        url: impl Into<String>,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> ClientFactory {
        let url = url.into();
        Arc::new(move || -> anyhow::Result<Box<dyn Ping>> {
            let client = redis::Client::open(url.as_str())?;
            Ok(Box::new(RedisPing::with_timeouts(
                client,
                connect_timeout,
                response_timeout,
            )))
        })
    }
}

#[async_trait]
impl Ping for RedisPing {
    async fn ping(&self) -> anyhow::Result<bool> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection_with_timeouts(
                self.response_timeout,
                self.connect_timeout,
            )
            .await?;
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(reply == "PONG")
    }
}
