//! Fire-and-forget forwarding of stage results.

use super::{EventSink, LoggingEventSink, NoOpEventSink};
use crate::config::NotifyConfig;
use crate::core::StageResult;
use crate::utils::format_iso8601;
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Event type used for forwarded stage results.
pub const GATE_RESULT_EVENT: &str = "gate.result";

/// Forwards each stage result to an [`EventSink`] without letting the
/// sink affect the pipeline.
///
/// Inside a Tokio runtime the emit runs on a detached task bounded by the
/// configured timeout; outside one, the sink's non-blocking `try_emit` is
/// used instead.
#[derive(Clone)]
pub struct StageNotifier {
    sink: Arc<dyn EventSink>,
    timeout: Duration,
    max_details: usize,
}

impl fmt::Debug for StageNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageNotifier")
            .field("timeout", &self.timeout)
            .field("max_details", &self.max_details)
            .finish_non_exhaustive()
    }
}

impl Default for StageNotifier {
    fn default() -> Self {
        Self::disabled()
    }
}

impl StageNotifier {
    /// Creates a notifier for `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>, config: &NotifyConfig) -> Self {
        Self {
            sink,
            timeout: config.timeout(),
            max_details: config.max_details,
        }
    }

    /// A notifier that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoOpEventSink), &NotifyConfig::default())
    }

    /// A notifier that writes stage results to the debug log.
    #[must_use]
    pub fn logging(config: &NotifyConfig) -> Self {
        Self::new(Arc::new(LoggingEventSink::debug()), config)
    }

    /// Builds the forwarded payload. Details are truncated to
    /// `max_details` lines.
    #[must_use]
    pub fn payload(&self, result: &StageResult, target: &Path) -> Value {
        let details: Vec<&String> = result.details().iter().take(self.max_details).collect();
        json!({
            "gate_number": result.stage(),
            "gate_name": result.name(),
            "status": result.status(),
            "message": result.message(),
            "details": details,
            "file_path": target.display().to_string(),
            "timestamp": format_iso8601(&result.created_at()),
        })
    }

    /// Forwards `result` without waiting for delivery.
    pub fn forward(&self, result: &StageResult, target: &Path) {
        let payload = self.payload(result, target);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let sink = Arc::clone(&self.sink);
                let timeout = self.timeout;
                let stage = result.stage();
                handle.spawn(async move {
                    if tokio::time::timeout(timeout, sink.emit(GATE_RESULT_EVENT, Some(payload)))
                        .await
                        .is_err()
                    {
                        debug!(stage, ?timeout, "stage notification timed out");
                    }
                });
            }
            Err(_) => self.sink.try_emit(GATE_RESULT_EVENT, Some(payload)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageKind;
    use crate::events::CollectingEventSink;
    use async_trait::async_trait;

    #[test]
    fn test_payload_truncates_details() {
        let config = NotifyConfig {
            max_details: 2,
            ..NotifyConfig::default()
        };
        let notifier = StageNotifier::new(Arc::new(NoOpEventSink), &config);
        let result = StageResult::failed(StageKind::Scan, "3 issues").with_details(["a", "b", "c"]);

        let payload = notifier.payload(&result, Path::new("auth.py"));
        assert_eq!(payload["gate_number"], 4);
        assert_eq!(payload["gate_name"], "Review Agent");
        assert_eq!(payload["status"], "failed");
        assert_eq!(payload["details"].as_array().unwrap().len(), 2);
        assert_eq!(payload["file_path"], "auth.py");
    }

    #[test]
    fn test_forward_without_runtime_uses_try_emit() {
        let sink = Arc::new(CollectingEventSink::new());
        let notifier = StageNotifier::new(sink.clone(), &NotifyConfig::default());

        notifier.forward(&StageResult::passed(StageKind::Syntax, "ok"), Path::new("a.py"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].0, GATE_RESULT_EVENT);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_logging_notifier_writes_debug_log() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let notifier = StageNotifier::logging(&NotifyConfig::default());
        tracing::subscriber::with_default(subscriber, || {
            notifier.forward(&StageResult::failed(StageKind::Scan, "1 issue"), Path::new("auth.py"));
        });

        let output = String::from_utf8_lossy(&log.0.lock()).into_owned();
        assert!(output.contains(GATE_RESULT_EVENT));
        assert!(output.contains("auth.py"));
    }

    #[tokio::test]
    async fn test_forward_in_runtime_is_detached() {
        let sink = Arc::new(CollectingEventSink::new());
        let notifier = StageNotifier::new(sink.clone(), &NotifyConfig::default());

        notifier.forward(&StageResult::passed(StageKind::Syntax, "ok"), Path::new("a.py"));
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(sink.len(), 1);
    }

    struct HangingSink;

    #[async_trait]
    impl EventSink for HangingSink {
        async fn emit(&self, _event_type: &str, _data: Option<Value>) {
            std::future::pending::<()>().await;
        }

        fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
    }

    #[tokio::test]
    async fn test_hanging_sink_does_not_block_forward() {
        let config = NotifyConfig {
            timeout_seconds: 0.05,
            ..NotifyConfig::default()
        };
        let notifier = StageNotifier::new(Arc::new(HangingSink), &config);

        let started = std::time::Instant::now();
        notifier.forward(&StageResult::warning(StageKind::Impact, "slow"), Path::new("a.py"));
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
