//! Test assertions for pipeline results.

use crate::core::{GateStatus, OverallStatus, PipelineResult};

/// Asserts that stage `stage` ran and reported `expected`.
pub fn assert_stage_status(result: &PipelineResult, stage: u8, expected: GateStatus) {
    let Some(actual) = result.stage(stage) else {
        panic!("Expected stage {stage} to have run, ran: {:?}", stage_numbers(result));
    };
    assert_eq!(
        actual.status(),
        expected,
        "Expected stage {stage} status {expected:?}, got {:?} ({})",
        actual.status(),
        actual.message()
    );
}

/// Asserts that stage `stage` has a detail containing `needle`.
pub fn assert_stage_detail(result: &PipelineResult, stage: u8, needle: &str) {
    let Some(actual) = result.stage(stage) else {
        panic!("Expected stage {stage} to have run, ran: {:?}", stage_numbers(result));
    };
    assert!(
        actual.has_detail(needle),
        "Expected a stage {stage} detail containing '{needle}', got {:?}",
        actual.details()
    );
}

/// Asserts that stage `stage` did not run.
pub fn assert_stage_absent(result: &PipelineResult, stage: u8) {
    assert!(
        result.stage(stage).is_none(),
        "Expected stage {stage} not to run, ran: {:?}",
        stage_numbers(result)
    );
}

/// Asserts the stage at which the run halted, or `None` for a full run.
pub fn assert_stopped_at(result: &PipelineResult, expected: Option<u8>) {
    assert_eq!(
        result.stopped_at(),
        expected,
        "Expected stopped_at {expected:?}, got {:?}",
        result.stopped_at()
    );
}

/// Asserts the overall status.
pub fn assert_overall(result: &PipelineResult, expected: OverallStatus) {
    assert_eq!(
        result.overall_status(),
        expected,
        "Expected overall {expected:?}, got {:?} ({})",
        result.overall_status(),
        result.summary()
    );
}

fn stage_numbers(result: &PipelineResult) -> Vec<u8> {
    result.stages().iter().map(|s| s.stage()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageKind, StageResult};
    use std::time::Duration;
    use uuid::Uuid;

    fn sample() -> PipelineResult {
        PipelineResult::from_parts(
            Uuid::new_v4(),
            vec![StageResult::warning(StageKind::Syntax, "w").with_details(["L3: too long"])],
            None,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_assertions_pass() {
        let result = sample();
        assert_stage_status(&result, 1, GateStatus::Warning);
        assert_stage_detail(&result, 1, "too long");
        assert_stage_absent(&result, 2);
        assert_stopped_at(&result, None);
        assert_overall(&result, OverallStatus::Warning);
    }

    #[test]
    #[should_panic(expected = "Expected stage 2 to have run")]
    fn test_missing_stage_panics() {
        assert_stage_status(&sample(), 2, GateStatus::Passed);
    }
}
