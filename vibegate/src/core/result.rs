//! Immutable record of one gate's outcome.

use super::{GateStatus, StageKind};
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};

/// The outcome of running one gate.
///
/// `StageResult` is immutable once created: fields are only readable
/// through accessors, and the `with_*` helpers consume the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    stage: u8,
    name: String,
    status: GateStatus,
    message: String,
    #[serde(default)]
    details: Vec<String>,
    created_at: Timestamp,
}

impl StageResult {
    /// Creates a result for a stage kind.
    #[must_use]
    pub fn new(kind: StageKind, status: GateStatus, message: impl Into<String>) -> Self {
        Self::for_stage(kind.number(), kind.display_name(), status, message)
    }

    /// Creates a result for an arbitrary stage number and name.
    ///
    /// Used by external collaborators that produce results in this shape.
    #[must_use]
    pub fn for_stage(
        stage: u8,
        name: impl Into<String>,
        status: GateStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            name: name.into(),
            status,
            message: message.into(),
            details: Vec::new(),
            created_at: now_utc(),
        }
    }

    /// Creates a passed result.
    #[must_use]
    pub fn passed(kind: StageKind, message: impl Into<String>) -> Self {
        Self::new(kind, GateStatus::Passed, message)
    }

    /// Creates a warning result.
    #[must_use]
    pub fn warning(kind: StageKind, message: impl Into<String>) -> Self {
        Self::new(kind, GateStatus::Warning, message)
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(kind: StageKind, message: impl Into<String>) -> Self {
        Self::new(kind, GateStatus::Failed, message)
    }

    /// Creates a skipped result.
    #[must_use]
    pub fn skipped(kind: StageKind, message: impl Into<String>) -> Self {
        Self::new(kind, GateStatus::Skipped, message)
    }

    /// Attaches diagnostic detail lines.
    #[must_use]
    pub fn with_details<I, S>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(details.into_iter().map(Into::into));
        self
    }

    /// Returns the stage ordinal.
    #[must_use]
    pub const fn stage(&self) -> u8 {
        self.stage
    }

    /// Returns the stage kind, if the ordinal is one of the six known kinds.
    #[must_use]
    pub const fn kind(&self) -> Option<StageKind> {
        StageKind::from_number(self.stage)
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> GateStatus {
        self.status
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the ordered diagnostic details.
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Returns when the result was created.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns true if any detail line contains `needle`.
    #[must_use]
    pub fn has_detail(&self, needle: &str) -> bool {
        self.details.iter().any(|d| d.contains(needle))
    }
}
