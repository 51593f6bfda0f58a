//! Aggregated result of one gate chain run.

use super::{GateStatus, OverallStatus, StageResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// The result of one pipeline run.
///
/// Built by the orchestrator while the run is in progress; once returned
/// to the caller it only exposes read accessors.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    run_id: Uuid,
    stages: Vec<StageResult>,
    stopped_at: Option<u8>,
    elapsed: Duration,
    overall_status: OverallStatus,
}

impl PipelineResult {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            stages: Vec::new(),
            stopped_at: None,
            elapsed: Duration::ZERO,
            overall_status: OverallStatus::Passed,
        }
    }

    /// Assembles a result from parts, deriving the overall status.
    ///
    /// A `stopped_at` marker forces `Failed`; otherwise the stage statuses
    /// are rolled up.
    #[must_use]
    pub fn from_parts(
        run_id: Uuid,
        stages: Vec<StageResult>,
        stopped_at: Option<u8>,
        elapsed: Duration,
    ) -> Self {
        let mut result = Self {
            run_id,
            stages,
            stopped_at: None,
            elapsed,
            overall_status: OverallStatus::Passed,
        };
        match stopped_at {
            Some(stage) => result.halt(stage),
            None => result.finalize(),
        }
        result
    }

    pub(crate) fn push(&mut self, stage: StageResult) {
        self.stages.push(stage);
    }

    /// Records an early exit at `stage`; the run is failed.
    pub(crate) fn halt(&mut self, stage: u8) {
        self.stopped_at = Some(stage);
        self.overall_status = OverallStatus::Failed;
    }

    /// Derives the overall status when no halt occurred.
    pub(crate) fn finalize(&mut self) {
        if self.stopped_at.is_some() {
            return;
        }
        self.overall_status = OverallStatus::rollup(self.stages.iter().map(StageResult::status));
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the stage results in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageResult] {
        &self.stages
    }

    /// Returns the result of a given stage number, if it ran.
    #[must_use]
    pub fn stage(&self, number: u8) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage() == number)
    }

    /// Returns the stage at which the run halted, if any.
    #[must_use]
    pub const fn stopped_at(&self) -> Option<u8> {
        self.stopped_at
    }

    /// Returns the cumulative elapsed time.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the derived overall status.
    #[must_use]
    pub const fn overall_status(&self) -> OverallStatus {
        self.overall_status
    }

    /// Counts stages with the given status.
    #[must_use]
    pub fn count(&self, status: GateStatus) -> usize {
        self.stages.iter().filter(|s| s.status() == status).count()
    }

    /// Human summary: `passed:N failed:N warning:N skipped:N / elapsed:T.Ts`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "passed:{} failed:{} warning:{} skipped:{} / elapsed:{:.1}s",
            self.count(GateStatus::Passed),
            self.count(GateStatus::Failed),
            self.count(GateStatus::Warning),
            self.count(GateStatus::Skipped),
            self.elapsed.as_secs_f64(),
        )
    }

    /// Builds the serializable report.
    #[must_use]
    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            run_id: self.run_id,
            overall_status: self.overall_status,
            summary: self.summary(),
            stopped_at: self.stopped_at,
            elapsed_seconds: self.elapsed.as_secs_f64(),
            stages: self.stages.clone(),
        }
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.report())
    }
}

/// Wire form of a [`PipelineResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Overall status.
    pub overall_status: OverallStatus,
    /// Human summary string.
    pub summary: String,
    /// Stage at which the run halted, or null.
    pub stopped_at: Option<u8>,
    /// Elapsed wall time in seconds.
    pub elapsed_seconds: f64,
    /// Stage results in execution order.
    pub stages: Vec<StageResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageKind;

    fn results(statuses: &[GateStatus]) -> Vec<StageResult> {
        statuses
            .iter()
            .zip(StageKind::ALL)
            .map(|(status, kind)| StageResult::new(kind, *status, "synthetic"))
            .collect()
    }

    #[test]
    fn test_status_precedence_matrix() {
        use GateStatus::{Failed, Passed, Warning};

        let cases: [(&[GateStatus], bool, OverallStatus); 6] = [
            (&[Passed, Failed, Warning], false, OverallStatus::Failed),
            (&[Passed, Failed, Warning], true, OverallStatus::Failed),
            (&[Passed, Warning, Passed], false, OverallStatus::Warning),
            (&[Passed, Warning, Passed], true, OverallStatus::Failed),
            (&[Passed, Passed, Passed], false, OverallStatus::Passed),
            (&[Passed, Passed, Passed], true, OverallStatus::Failed),
        ];

        for (statuses, stopped, expected) in cases {
            let stopped_at = stopped.then_some(2);
            let result = PipelineResult::from_parts(
                Uuid::new_v4(),
                results(statuses),
                stopped_at,
                Duration::ZERO,
            );
            assert_eq!(result.overall_status(), expected, "{statuses:?} stopped={stopped}");
            assert_eq!(result.stopped_at(), stopped_at);
        }
    }

    #[test]
    fn test_failed_only_case_and_failed_warning_case() {
        use GateStatus::{Failed, Passed, Warning};

        let failed_only =
            PipelineResult::from_parts(Uuid::new_v4(), results(&[Failed, Passed]), None, Duration::ZERO);
        assert_eq!(failed_only.overall_status(), OverallStatus::Failed);

        let warning_then_failed =
            PipelineResult::from_parts(Uuid::new_v4(), results(&[Warning, Failed]), None, Duration::ZERO);
        assert_eq!(warning_then_failed.overall_status(), OverallStatus::Failed);
    }

    #[test]
    fn test_summary_format() {
        use GateStatus::{Failed, Passed, Skipped, Warning};

        let result = PipelineResult::from_parts(
            Uuid::new_v4(),
            results(&[Passed, Passed, Warning, Failed, Skipped]),
            None,
            Duration::from_millis(1200),
        );

        assert_eq!(
            result.summary(),
            "passed:2 failed:1 warning:1 skipped:1 / elapsed:1.2s"
        );
    }

    #[test]
    fn test_stage_lookup() {
        let result = PipelineResult::from_parts(
            Uuid::new_v4(),
            results(&[GateStatus::Passed, GateStatus::Warning]),
            None,
            Duration::ZERO,
        );
        assert_eq!(result.stage(2).map(StageResult::status), Some(GateStatus::Warning));
        assert!(result.stage(3).is_none());
    }

    #[test]
    fn test_report_serialization() {
        let result = PipelineResult::from_parts(
            Uuid::new_v4(),
            results(&[GateStatus::Failed]),
            Some(1),
            Duration::ZERO,
        );
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["overall_status"], "failed");
        assert_eq!(json["stopped_at"], 1);
        assert_eq!(json["stages"].as_array().unwrap().len(), 1);
        assert!(json["summary"].as_str().unwrap().starts_with("passed:0 failed:1"));
    }

    #[test]
    fn test_report_null_stopped_at() {
        let result = PipelineResult::from_parts(Uuid::new_v4(), Vec::new(), None, Duration::ZERO);
        let json = serde_json::to_value(result.report()).unwrap();
        assert!(json["stopped_at"].is_null());
    }
}
