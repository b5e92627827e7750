// User-supplied dependency checker

use async_trait::async_trait;
use http::StatusCode;
use std::sync::Arc;

use super::{StatusCheck, StatusReport};

/// Zero-argument check; `Ok(Some(msg))` overrides the default success message
pub type CustomCheck = Arc<dyn Fn() -> anyhow::Result<Option<String>> + Send + Sync>;

pub struct CustomChecker {
    name: String,
    check: CustomCheck,
}

impl CustomChecker {
    pub fn new(name: impl Into<String>, check: CustomCheck) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl StatusCheck for CustomChecker {
    async fn check(&self) -> StatusReport {
        // User code may block, keep it off the async workers
        let check = Arc::clone(&self.check);
        let outcome = match tokio::task::spawn_blocking(move || check()).await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow::anyhow!("check panicked: {}", join_err)),
        };

        match outcome {
            Ok(Some(message)) if !message.is_empty() => {
                StatusReport::message(StatusCode::OK, message)
            }
            Ok(_) => StatusReport::message(StatusCode::OK, format!("{} is available", self.name)),
            Err(e) => {
                tracing::warn!("Custom check {} failed: {}", self.name, e);
                StatusReport::message(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{} is not available: {}", self.name, e),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checker(
        name: &str,
        f: impl Fn() -> anyhow::Result<Option<String>> + Send + Sync + 'static,
    ) -> CustomChecker {
        CustomChecker::new(name, Arc::new(f))
    }

    #[tokio::test]
    async fn test_returned_message_is_used() {
        let report = checker("custom", || Ok(Some("Service Available".to_string()))).check().await;
        assert_eq!(report.status, StatusCode::OK);
        assert_eq!(report.body, json!({ "status": "Service Available" }));
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_to_default_message() {
        let report = checker("custom-default-message", || Ok(None)).check().await;
        assert_eq!(report.body, json!({ "status": "custom-default-message is available" }));

        let report = checker("queue", || Ok(Some(String::new()))).check().await;
        assert_eq!(report.status, StatusCode::OK);
        assert_eq!(report.body, json!({ "status": "queue is available" }));
    }

    #[tokio::test]
    async fn test_error_is_reported_with_its_text() {
        let report = checker("broken-custom", || Err(anyhow::anyhow!("Service Error")))
            .check()
            .await;
        assert_eq!(report.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            report.body,
            json!({ "status": "broken-custom is not available: Service Error" })
        );
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_unavailable() {
        let report = checker("flaky", || panic!("boom")).check().await;
        assert_eq!(report.status, StatusCode::SERVICE_UNAVAILABLE);
        let message = report.body["status"].as_str().unwrap();
        assert!(message.starts_with("flaky is not available: check panicked"));
    }
}
