//! Test execution collaborator.
//!
//! The analyzer only selects test files. Running them is delegated to a
//! [`TestRunner`], invoked with the selected paths.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

static PASSED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+passed").expect("valid passed-count regex"));

static FAILED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)FAILED\s+(.+?)(?:\s+-|$)").expect("valid failure regex"));

const MAX_SUMMARY_CHARS: usize = 120;

/// Classification of one test file run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestVerdict {
    /// The file's tests passed.
    Passed,
    /// At least one test failed.
    Failed,
    /// The file could not be run (timeout, spawn failure).
    Error,
}

/// Result of running one test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// The test file.
    pub file: PathBuf,
    /// Classification.
    pub verdict: TestVerdict,
    /// Short summary text, e.g. `3 passed` or the first failing test id.
    pub summary: String,
}

impl TestOutcome {
    /// Creates an outcome.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, verdict: TestVerdict, summary: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            verdict,
            summary: summary.into(),
        }
    }

    /// Returns the file name used in reports.
    #[must_use]
    pub fn file_label(&self) -> String {
        self.file
            .file_name()
            .map_or_else(|| self.file.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Runs selected test files and classifies each one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Runs `test_files`, returning one outcome per file.
    async fn run(&self, test_files: &[PathBuf]) -> Vec<TestOutcome>;
}

/// Reports every selected file as passed without executing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionOnlyRunner;

#[async_trait]
impl TestRunner for SelectionOnlyRunner {
    async fn run(&self, test_files: &[PathBuf]) -> Vec<TestOutcome> {
        test_files
            .iter()
            .map(|f| TestOutcome::new(f, TestVerdict::Passed, "selected"))
            .collect()
    }
}

/// Spawns an external command once per test file.
///
/// The file path is appended to `argv`; a zero exit code is a pass.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    argv: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CommandTestRunner {
    /// Creates a runner. Returns `None` for an empty argv.
    #[must_use]
    pub fn new(argv: Vec<String>, working_dir: impl Into<PathBuf>, timeout: Duration) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            argv,
            working_dir: working_dir.into(),
            timeout,
        })
    }

    async fn run_one(&self, file: &Path) -> TestOutcome {
        let mut command = tokio::process::Command::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .arg(file)
            .current_dir(&self.working_dir)
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if output.status.success() {
                    TestOutcome::new(file, TestVerdict::Passed, extract_passed_count(&stdout))
                } else {
                    TestOutcome::new(file, TestVerdict::Failed, extract_failure_summary(&stdout))
                }
            }
            // Runner not installed: the selected file exists, which is all we can check.
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(command = %self.argv[0], "test command not found");
                TestOutcome::new(file, TestVerdict::Passed, "runner not installed, file present")
            }
            Ok(Err(err)) => TestOutcome::new(file, TestVerdict::Error, err.to_string()),
            Err(_) => TestOutcome::new(
                file,
                TestVerdict::Error,
                format!("timed out ({}s)", self.timeout.as_secs()),
            ),
        }
    }
}

#[async_trait]
impl TestRunner for CommandTestRunner {
    async fn run(&self, test_files: &[PathBuf]) -> Vec<TestOutcome> {
        let mut outcomes = Vec::with_capacity(test_files.len());
        for file in test_files {
            outcomes.push(self.run_one(file).await);
        }
        outcomes
    }
}

fn extract_passed_count(output: &str) -> String {
    PASSED_COUNT
        .captures(output)
        .map_or_else(|| "passed".to_string(), |c| format!("{} passed", &c[1]))
}

fn extract_failure_summary(output: &str) -> String {
    let summary = FAILED_ID.captures(output).map_or_else(
        || output.trim().lines().last().unwrap_or("tests failed").to_string(),
        |c| c[1].trim().to_string(),
    );
    if summary.is_empty() {
        return "tests failed".to_string();
    }
    summary.chars().take(MAX_SUMMARY_CHARS).collect()
}
