//! Event emission.
//!
//! Stage results and work-zone lifecycle changes are published to an
//! [`EventSink`]. Nothing published here can change a pipeline outcome.

#[cfg(feature = "dashboard")]
mod dashboard;
mod notifier;
mod sink;

#[cfg(feature = "dashboard")]
pub use dashboard::{DashboardEventSink, DEFAULT_DASHBOARD_ENDPOINT};
pub use notifier::{StageNotifier, GATE_RESULT_EVENT};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
