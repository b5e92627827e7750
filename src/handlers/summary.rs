// Root /_status handler

use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::services::{StatusCheck, StatusReport};

#[derive(Debug, Serialize)]
struct SummaryResponse<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    related: Option<&'a BTreeSet<String>>,
}

/// Always healthy; lists the per-dependency paths when dependencies were given
pub struct StatusSummary {
    related: Option<BTreeSet<String>>,
}

impl StatusSummary {
    pub fn new(related: Option<BTreeSet<String>>) -> Self {
        Self { related }
    }
}

#[async_trait]
impl StatusCheck for StatusSummary {
    async fn check(&self) -> StatusReport {
        let body = SummaryResponse {
            status: "OK",
            related: self.related.as_ref(),
        };
        // Serializing a string and a string set cannot fail
        let body = serde_json::to_value(body).unwrap_or_default();
        StatusReport::new(StatusCode::OK, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_without_dependencies_has_no_related_field() {
        let report = StatusSummary::new(None).check().await;
        assert_eq!(report.status, StatusCode::OK);
        assert_eq!(report.body, json!({ "status": "OK" }));
    }

    #[tokio::test]
    async fn test_related_paths_are_listed_once() {
        let related: BTreeSet<String> = ["/_status/db", "/_status/cache", "/_status/db"]
            .into_iter()
            .map(String::from)
            .collect();
        let report = StatusSummary::new(Some(related)).check().await;
        assert_eq!(
            report.body,
            json!({ "status": "OK", "related": ["/_status/cache", "/_status/db"] })
        );
    }
}
