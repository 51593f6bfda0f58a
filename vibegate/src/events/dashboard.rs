//! HTTP sink posting gate results to a dashboard.

use super::EventSink;
use crate::config::NotifyConfig;
use crate::errors::{Result, VibeGateError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Default dashboard endpoint.
pub const DEFAULT_DASHBOARD_ENDPOINT: &str = "http://127.0.0.1:8000/api/gate-result";

/// POSTs event payloads as JSON to a dashboard endpoint.
///
/// Delivery failures are logged at debug level and dropped.
#[derive(Debug, Clone)]
pub struct DashboardEventSink {
    client: Client,
    endpoint: String,
}

impl DashboardEventSink {
    /// Creates a sink for `endpoint` with the configured request timeout.
    pub fn new(endpoint: impl Into<String>, config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| VibeGateError::Notification(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Creates a sink from the `notify` config section, falling back to
    /// [`DEFAULT_DASHBOARD_ENDPOINT`].
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_DASHBOARD_ENDPOINT.to_string());
        Self::new(endpoint, config)
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(client: Client, endpoint: String, event_type: String, data: Value) {
        match client.post(&endpoint).json(&data).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(endpoint = %endpoint, event_type = %event_type, status = %response.status(), "dashboard rejected event");
            }
            Ok(_) => {}
            Err(err) => debug!(endpoint = %endpoint, event_type = %event_type, error = %err, "dashboard unreachable"),
        }
    }
}

#[async_trait]
impl EventSink for DashboardEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        let Some(data) = data else { return };
        Self::post(self.client.clone(), self.endpoint.clone(), event_type.to_string(), data).await;
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        let Some(data) = data else { return };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(Self::post(
                    self.client.clone(),
                    self.endpoint.clone(),
                    event_type.to_string(),
                    data,
                ));
            }
            Err(_) => debug!(event_type, "no runtime available, dashboard event dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config_default_endpoint() {
        let sink = DashboardEventSink::from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(sink.endpoint(), DEFAULT_DASHBOARD_ENDPOINT);
    }

    #[tokio::test]
    async fn test_unreachable_dashboard_is_silent() {
        let config = NotifyConfig {
            timeout_seconds: 0.5,
            ..NotifyConfig::default()
        };
        // Port 9 (discard) on localhost is expected to refuse connections.
        let sink = DashboardEventSink::new("http://127.0.0.1:9/api/gate-result", &config).unwrap();
        sink.emit("gate.result", Some(json!({"gate_number": 1}))).await;
        sink.emit("gate.result", None).await;
    }
}
