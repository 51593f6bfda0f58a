//! Stub gates and a stub test runner.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{GateStatus, StageKind, StageResult};
use crate::impact::{TestOutcome, TestRunner, TestVerdict};
use crate::stages::{GateContext, GateStage};

/// A gate that returns a configurable status and counts its calls.
#[derive(Debug)]
pub struct StaticGate {
    kind: StageKind,
    result: Mutex<StageResult>,
    call_count: Mutex<usize>,
}

impl StaticGate {
    /// Creates a gate of `kind` that returns `status`.
    #[must_use]
    pub fn new(kind: StageKind, status: GateStatus) -> Self {
        Self::with_result(StageResult::new(kind, status, format!("stub {status}")))
    }

    /// Creates a gate that returns `result`; the kind is taken from it.
    ///
    /// # Panics
    ///
    /// Panics if `result` does not carry a stage number in `1..=6`.
    #[must_use]
    pub fn with_result(result: StageResult) -> Self {
        let kind = result
            .kind()
            .unwrap_or_else(|| panic!("stub result has no stage kind: {}", result.stage()));
        Self {
            kind,
            result: Mutex::new(result),
            call_count: Mutex::new(0),
        }
    }

    /// Replaces the status returned from now on.
    pub fn set_status(&self, status: GateStatus) {
        *self.result.lock() = StageResult::new(self.kind, status, format!("stub {status}"));
    }

    /// Number of runs so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl GateStage for StaticGate {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, _ctx: &GateContext) -> StageResult {
        *self.call_count.lock() += 1;
        self.result.lock().clone()
    }
}

/// A gate that sleeps before passing.
#[derive(Debug)]
pub struct SlowGate {
    kind: StageKind,
    delay: Duration,
}

impl SlowGate {
    /// Creates a slow gate.
    #[must_use]
    pub const fn new(kind: StageKind, delay: Duration) -> Self {
        Self { kind, delay }
    }
}

#[async_trait]
impl GateStage for SlowGate {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, _ctx: &GateContext) -> StageResult {
        tokio::time::sleep(self.delay).await;
        StageResult::passed(self.kind, "slow pass")
    }
}

/// One recorded gate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    /// Stage number of the gate that ran.
    pub stage: u8,
    /// Target of the run.
    pub target: PathBuf,
    /// Author of the run.
    pub author: String,
}

/// A passing gate that appends every invocation to a shared log, so
/// several gates can record their relative order.
#[derive(Debug)]
pub struct RecordingGate {
    kind: StageKind,
    log: Arc<Mutex<Vec<RecordedRun>>>,
}

impl RecordingGate {
    /// Creates a recording gate writing to `log`.
    #[must_use]
    pub const fn new(kind: StageKind, log: Arc<Mutex<Vec<RecordedRun>>>) -> Self {
        Self { kind, log }
    }
}

#[async_trait]
impl GateStage for RecordingGate {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        self.log.lock().push(RecordedRun {
            stage: self.kind.number(),
            target: ctx.target().to_path_buf(),
            author: ctx.author().to_string(),
        });
        StageResult::passed(self.kind, "recorded")
    }
}

/// A test runner with canned verdicts keyed by file name.
#[derive(Debug)]
pub struct StubTestRunner {
    default: TestVerdict,
    verdicts: HashMap<String, TestVerdict>,
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl StubTestRunner {
    /// Creates a runner that reports `default` for every file.
    #[must_use]
    pub fn new(default: TestVerdict) -> Self {
        Self {
            default,
            verdicts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the verdict for files named `file_name`.
    #[must_use]
    pub fn with_verdict(mut self, file_name: impl Into<String>, verdict: TestVerdict) -> Self {
        self.verdicts.insert(file_name.into(), verdict);
        self
    }

    /// File sets passed to `run`, one entry per call.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().clone()
    }

    fn verdict_for(&self, file: &Path) -> TestVerdict {
        file.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.verdicts.get(n))
            .copied()
            .unwrap_or(self.default)
    }
}

#[async_trait]
impl TestRunner for StubTestRunner {
    async fn run(&self, test_files: &[PathBuf]) -> Vec<TestOutcome> {
        self.calls.lock().push(test_files.to_vec());
        test_files
            .iter()
            .map(|f| TestOutcome::new(f, self.verdict_for(f), "stubbed"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_gate() {
        let gate = StaticGate::new(StageKind::Rules, GateStatus::Warning);
        let ctx = GateContext::new("a.py");
        assert_eq!(gate.run(&ctx).await.status(), GateStatus::Warning);

        gate.set_status(GateStatus::Failed);
        let result = gate.run(&ctx).await;
        assert_eq!(result.status(), GateStatus::Failed);
        assert_eq!(result.stage(), 2);
        assert_eq!(gate.call_count(), 2);
    }

    #[tokio::test]
    async fn test_recording_gate() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let gate = RecordingGate::new(StageKind::Collision, Arc::clone(&log));
        gate.run(&GateContext::new("a.py").with_author("alice")).await;

        let runs = log.lock().clone();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].stage, 6);
        assert_eq!(runs[0].author, "alice");
    }

    #[tokio::test]
    async fn test_stub_runner_verdicts() {
        let runner = StubTestRunner::new(TestVerdict::Passed).with_verdict("test_b.py", TestVerdict::Failed);
        let files = vec![PathBuf::from("tests/test_a.py"), PathBuf::from("tests/test_b.py")];
        let outcomes = runner.run(&files).await;

        assert_eq!(outcomes[0].verdict, TestVerdict::Passed);
        assert_eq!(outcomes[1].verdict, TestVerdict::Failed);
        assert_eq!(runner.calls(), vec![files]);
    }
}
