//! Gate 3: impact analysis and related tests.

use super::{GateContext, GateStage};
use crate::config::VibeGateConfig;
use crate::core::{StageKind, StageResult};
use crate::impact::{
    CommandTestRunner, ImpactAnalyzer, ImpactReport, SelectionOnlyRunner, TestOutcome, TestRunner,
    TestVerdict,
};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const REPORT_PREVIEW: usize = 5;

/// Selects the tests relevant to the change and hands them to a
/// [`TestRunner`].
///
/// Any failing test file fails the gate; runner errors without failures
/// warn. A change with no related tests warns, recommending tests be
/// written. A failed source scan skips the gate.
#[derive(Clone)]
pub struct IntegrationGate {
    analyzer: Arc<ImpactAnalyzer>,
    runner: Arc<dyn TestRunner>,
}

impl fmt::Debug for IntegrationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationGate")
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}

impl IntegrationGate {
    /// Creates the gate with an explicit runner.
    #[must_use]
    pub fn new(analyzer: ImpactAnalyzer, runner: Arc<dyn TestRunner>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            runner,
        }
    }

    /// Creates the gate from configuration: a [`CommandTestRunner`] when a
    /// test command is configured, otherwise a [`SelectionOnlyRunner`].
    #[must_use]
    pub fn from_config(config: &VibeGateConfig) -> Self {
        let runner: Arc<dyn TestRunner> = CommandTestRunner::new(
            config.tests.command.clone(),
            &config.paths.project_root,
            config.tests.timeout(),
        )
        .map_or_else(
            || Arc::new(SelectionOnlyRunner) as Arc<dyn TestRunner>,
            |runner| Arc::new(runner),
        );
        Self::new(ImpactAnalyzer::new(config), runner)
    }

    async fn analyze(&self, changed: Vec<PathBuf>) -> Result<ImpactReport, String> {
        let analyzer = Arc::clone(&self.analyzer);
        match tokio::task::spawn_blocking(move || analyzer.report(&changed)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(scan)) => Err(format!("impact scan failed: {scan}")),
            Err(join) => Err(format!("impact scan aborted: {join}")),
        }
    }
}

#[async_trait]
impl GateStage for IntegrationGate {
    fn kind(&self) -> StageKind {
        StageKind::Impact
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        if ctx.changed_files().is_empty() {
            return StageResult::skipped(StageKind::Impact, "no changed files to analyze");
        }

        let report = match self.analyze(ctx.changed_files().to_vec()).await {
            Ok(report) => report,
            Err(message) => return StageResult::skipped(StageKind::Impact, message),
        };

        if !report.has_tests() {
            let details: Vec<String> = report
                .changed_files
                .iter()
                .map(|f| format!("changed: {}", file_label(f)))
                .chain([format!("impact: {} module(s)", report.impacted.len())])
                .collect();
            return StageResult::warning(
                StageKind::Impact,
                "no related tests found - write tests for the changed code",
            )
            .with_details(details);
        }

        let tests: Vec<PathBuf> = report.related_tests.iter().cloned().collect();
        let outcomes = self.runner.run(&tests).await;
        debug!(tests = tests.len(), outcomes = outcomes.len(), "related tests executed");

        let count = |verdict| outcomes.iter().filter(|o| o.verdict == verdict).count();
        let (passed, failed, errors) = (
            count(TestVerdict::Passed),
            count(TestVerdict::Failed),
            count(TestVerdict::Error),
        );
        let details = build_report(&report, &outcomes);

        let result = if failed > 0 {
            StageResult::failed(StageKind::Impact, format!("{failed} test file(s) failed"))
        } else if errors > 0 {
            StageResult::warning(
                StageKind::Impact,
                format!("{errors} test file(s) could not be run, {passed} passed"),
            )
        } else {
            StageResult::passed(
                StageKind::Impact,
                format!(
                    "{passed} test file(s) passed (impact: {} module(s))",
                    report.impacted.len()
                ),
            )
        };
        result.with_details(details)
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn build_report(report: &ImpactReport, outcomes: &[TestOutcome]) -> Vec<String> {
    let mut lines = vec![format!("[changed] {} file(s)", report.changed_files.len())];
    lines.extend(
        report
            .changed_files
            .iter()
            .take(REPORT_PREVIEW)
            .map(|f| format!("  - {}", file_label(f))),
    );

    lines.push(format!("[impact] {} module(s)", report.impacted.len()));
    lines.extend(report.impacted.iter().take(REPORT_PREVIEW).map(|m| format!("  - {m}")));
    if report.impacted.len() > REPORT_PREVIEW {
        lines.push(format!("  ... and {} more", report.impacted.len() - REPORT_PREVIEW));
    }

    for (verdict, heading, marker) in [
        (TestVerdict::Passed, "passed", "ok"),
        (TestVerdict::Failed, "failed", "FAIL"),
        (TestVerdict::Error, "error", "ERR"),
    ] {
        let group: Vec<&TestOutcome> = outcomes.iter().filter(|o| o.verdict == verdict).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(format!("[{heading}] {}", group.len()));
        lines.extend(
            group
                .iter()
                .map(|o| format!("  {marker} {}: {}", o.file_label(), o.summary)),
        );
    }
    lines
}
