// Dependency status checkers
//
// Each checker performs a single check per request and renders the outcome
// as a JSON status body. Failures are converted to 503 bodies here and never
// propagate to the dispatcher.

pub mod cache;
pub mod custom;
pub mod database;
pub mod http_service;
pub mod search;

use async_trait::async_trait;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::{json, Value};

pub use cache::{CacheChecker, RedisPing};
pub use custom::{CustomCheck, CustomChecker};
pub use database::{connect_database, DatabaseChecker};
pub use http_service::{ServiceChecker, ServiceKind};
pub use search::{ElasticsearchPing, SearchChecker};

/// Outcome of one check: an HTTP status plus the JSON body to send
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: StatusCode,
    pub body: Value,
}

impl StatusReport {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// `{"status": <message>}` with the given code
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "status": message.into() }))
    }
}

impl IntoResponse for StatusReport {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Anything that can produce a status report for one route
#[async_trait]
pub trait StatusCheck: Send + Sync {
    async fn check(&self) -> StatusReport;
}

/// Liveness ping against a client produced by a dependency factory
#[async_trait]
pub trait Ping: Send + Sync {
    /// Returns `Ok(false)` when the server answered but reported itself unavailable
    async fn ping(&self) -> anyhow::Result<bool>;
}

/// Zero-argument factory that builds a fresh pingable client on every check
pub type ClientFactory = std::sync::Arc<dyn Fn() -> anyhow::Result<Box<dyn Ping>> + Send + Sync>;

/// Shared body of the cache and search checkers: build, ping, translate
pub(crate) async fn ping_with_factory(factory: &ClientFactory) -> anyhow::Result<bool> {
    let client = factory()?;
    client.ping().await
}
