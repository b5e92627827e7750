// Remote HTTP service checker

use async_trait::async_trait;
use http::StatusCode;
use reqwest::{header::USER_AGENT, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;

use super::{StatusCheck, StatusReport};
use crate::error::HealthCheckResult;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// The kinds of remote service that can be checked, each with its own status path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Backend,
    Platform,
    Frontend,
    FileServer,
}

impl ServiceKind {
    /// Path appended to the service base URL when probing
    pub fn check_path(&self) -> &'static str {
        match self {
            ServiceKind::Backend => "/admin/_status",
            ServiceKind::Platform => "/crossdomain.xml",
            ServiceKind::Frontend | ServiceKind::FileServer => "/_status",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Backend => "backend",
            ServiceKind::Platform => "platform",
            ServiceKind::Frontend => "frontend",
            ServiceKind::FileServer => "file-server",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed service check, serialized into the `errors` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceFailure {
    pub message: String,
    pub error: String,
}

/// Checks a remote service with a HEAD request against its kind-specific path
pub struct ServiceChecker {
    client: Client,
    kind: ServiceKind,
    url: String,
    user_agent: String,
}

impl ServiceChecker {
    pub fn new(
        kind: ServiceKind,
        base_url: &str,
        user_agent: Option<&str>,
    ) -> HealthCheckResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()?;
        let url = format!("{}{}", base_url.trim_end_matches('/'), kind.check_path());
        let user_agent = user_agent
            .map(str::to_string)
            .unwrap_or_else(|| format!("hcheck/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            client,
            kind,
            url,
            user_agent,
        })
    }

    /// Full URL that will be requested
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues the HEAD request; `None` means the service answered with a 2xx
    pub async fn check_status(&self) -> Option<ServiceFailure> {
        let result = self
            .client
            .head(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => None,
            Err(e) => {
                let failure = classify_failure(&self.url, &e);
                tracing::warn!(
                    "{} service check failed: {} ({})",
                    self.kind,
                    failure.message,
                    failure.error
                );
                Some(failure)
            }
        }
    }
}

// Timeouts first: a connect timeout is also a connection error
fn classify_failure(url: &str, err: &reqwest::Error) -> ServiceFailure {
    let message = if err.is_timeout() {
        format!("Request timed out: {}", url)
    } else if err.is_connect() {
        format!("Connection failed: {}", url)
    } else {
        format!("Request failed: {}", url)
    };

    ServiceFailure {
        message,
        error: err.to_string(),
    }
}

#[async_trait]
impl StatusCheck for ServiceChecker {
    async fn check(&self) -> StatusReport {
        match self.check_status().await {
            None => StatusReport::new(StatusCode::OK, json!({ "status": "OK", "errors": null })),
            Some(failure) => StatusReport::new(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "status": "FAILED", "errors": failure }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_paths() {
        assert_eq!(ServiceKind::Backend.check_path(), "/admin/_status");
        assert_eq!(ServiceKind::Platform.check_path(), "/crossdomain.xml");
        assert_eq!(ServiceKind::Frontend.check_path(), "/_status");
        assert_eq!(ServiceKind::FileServer.check_path(), "/_status");
    }

    #[test]
    fn test_kind_names_round_trip_through_serde() {
        let kind: ServiceKind = serde_json::from_str("\"file-server\"").unwrap();
        assert_eq!(kind, ServiceKind::FileServer);
        assert_eq!(kind.to_string(), "file-server");
    }

    #[test]
    fn test_url_joins_base_and_check_path() {
        let checker =
            ServiceChecker::new(ServiceKind::Backend, "http://admin.local/", None).unwrap();
        assert_eq!(checker.url(), "http://admin.local/admin/_status");
    }

    #[tokio::test]
    async fn test_refused_connection_is_reported_as_connection_failure() {
        // Bind then drop to get a local port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base_url = format!("http://{}", addr);
        let checker =
            ServiceChecker::new(ServiceKind::Platform, &base_url, Some("test-agent")).unwrap();
        let failure = checker.check_status().await.expect("check should fail");
        assert_eq!(
            failure.message,
            format!("Connection failed: http://{}/crossdomain.xml", addr)
        );
        assert!(!failure.error.is_empty());
    }
}
