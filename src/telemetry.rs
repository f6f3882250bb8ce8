use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::config::TelemetryConfig;

const STACK: &str = "backend";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Log server answered with status {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Payload posted to the remote log server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub stack: &'static str,
    pub level: LogLevel,
    pub package: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

/// Posts events as JSON to `<base url>/log`
pub struct HttpTelemetrySink {
    client: Client,
    endpoint: String,
}

impl HttpTelemetrySink {
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/log", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let response = self.client.post(&self.endpoint).json(event).send().await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Status(response.status()));
        }
        Ok(())
    }
}

/// Fire-and-forget handle to the telemetry sink. Emitting never blocks and
/// never fails; delivery problems only show up in the local log.
#[derive(Clone)]
pub struct Telemetry {
    sink: Option<Arc<dyn TelemetrySink>>,
    client: String,
}

impl Telemetry {
    /// Builds the HTTP sink when telemetry is enabled. A sink that cannot be
    /// built leaves telemetry disabled.
    pub fn from_config(config: &TelemetryConfig, client: String) -> Self {
        if !config.enabled {
            debug!("Remote telemetry disabled");
            return Self::disabled();
        }

        match HttpTelemetrySink::new(config) {
            Ok(sink) => Self::with_sink(Arc::new(sink), client),
            Err(e) => {
                warn!("Could not build telemetry client, remote logging disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn with_sink(sink: Arc<dyn TelemetrySink>, client: String) -> Self {
        Self {
            sink: Some(sink),
            client,
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            client: String::new(),
        }
    }

    pub fn emit(&self, level: LogLevel, package: &str, message: impl Into<String>) {
        self.emit_for(level, package, message, None);
    }

    /// Emits an event on behalf of a caller, tagging it with their user agent
    /// when known and with this service's descriptor otherwise.
    pub fn emit_for(
        &self,
        level: LogLevel,
        package: &str,
        message: impl Into<String>,
        user_agent: Option<String>,
    ) {
        let Some(sink) = self.sink.clone() else {
            return;
        };

        let event = TelemetryEvent {
            stack: STACK,
            level,
            package: package.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            user_agent: user_agent.or_else(|| Some(self.client.clone())),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sink.send(&event).await {
                        warn!("Failed to deliver telemetry event: {}", e);
                    }
                });
            }
            Err(_) => debug!("No async runtime, dropping telemetry event: {}", event.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
            self.events.lock().push(event.clone());
            if self.fail {
                return Err(TelemetryError::Status(StatusCode::BAD_GATEWAY));
            }
            Ok(())
        }
    }

    async fn wait_for(sink: &RecordingSink, count: usize) {
        for _ in 0..100 {
            if sink.events.lock().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_emit_delivers_in_background() {
        let sink = Arc::new(RecordingSink::default());
        let telemetry = Telemetry::with_sink(sink.clone(), "url-alias/test".into());

        telemetry.emit(LogLevel::Info, "handler", "created 2 aliases");
        wait_for(&sink, 1).await;

        let events = sink.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Info);
        assert_eq!(events[0].package, "handler");
        assert_eq!(events[0].user_agent.as_deref(), Some("url-alias/test"));
    }

    #[tokio::test]
    async fn test_sink_failures_are_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let telemetry = Telemetry::with_sink(sink.clone(), "url-alias/test".into());

        telemetry.emit_for(LogLevel::Error, "handler", "boom", Some("curl/8".into()));
        wait_for(&sink, 1).await;

        assert_eq!(sink.events.lock()[0].user_agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn test_emit_without_runtime_is_a_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let telemetry = Telemetry::with_sink(sink.clone(), "url-alias/test".into());

        telemetry.emit(LogLevel::Warn, "handler", "dropped");
        Telemetry::disabled().emit(LogLevel::Warn, "handler", "ignored");

        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn test_event_payload_shape() {
        let event = TelemetryEvent {
            stack: STACK,
            level: LogLevel::Error,
            package: "store".into(),
            message: "m".into(),
            timestamp: Utc::now(),
            user_agent: Some("ua".into()),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["stack"], "backend");
        assert_eq!(value["level"], "error");
        assert_eq!(value["userAgent"], "ua");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_disabled_config_builds_no_sink() {
        let config = TelemetryConfig {
            enabled: false,
            url: "https://example-log-server.invalid".into(),
            timeout_ms: 4000,
        };
        assert!(Telemetry::from_config(&config, "c".into()).sink.is_none());
    }
}
