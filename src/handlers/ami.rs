// Cloud instance metadata handler for /_status/ami

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::error::HealthCheckResult;
use crate::services::{StatusCheck, StatusReport};

/// Link-local instance metadata endpoint returning the machine image id
pub const AMI_METADATA_ENDPOINT: &str = "http://169.254.169.254/latest/meta-data/ami-id";

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(3);

/// Reports the image id of the instance the process runs on.
///
/// A connect timeout means there is no metadata service (not running on a
/// cloud instance) and yields `{"ami-id": null}` at 200. Every other failure
/// is a 500.
pub struct AmiStatus {
    client: Client,
    endpoint: String,
}

impl AmiStatus {
    pub fn new(endpoint: impl Into<String>) -> HealthCheckResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn fetch_ami_id(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Maps the metadata lookup outcome to the `/_status/ami` response
fn ami_report(result: Result<String, reqwest::Error>) -> StatusReport {
    match result {
        Ok(ami_id) => StatusReport::new(StatusCode::OK, json!({ "ami-id": ami_id })),
        Err(e) if e.is_connect() && e.is_timeout() => {
            tracing::debug!("Metadata endpoint unreachable, assuming non-cloud host");
            StatusReport::new(StatusCode::OK, json!({ "ami-id": null }))
        }
        Err(e) => {
            tracing::error!("Failed to query instance metadata: {}", e);
            StatusReport::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            )
        }
    }
}

#[async_trait]
impl StatusCheck for AmiStatus {
    async fn check(&self) -> StatusReport {
        ami_report(self.fetch_ami_id().await)
    }
}
