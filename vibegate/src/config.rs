//! Configuration types for the gate chain.
//!
//! Every field carries a serde default so a partial JSON document (or an
//! empty `{}`) yields a usable configuration.

use crate::errors::{Result, VibeGateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VibeGateConfig {
    /// Project layout.
    #[serde(default)]
    pub paths: PathConfig,
    /// Impact analysis tuning.
    #[serde(default)]
    pub impact: ImpactConfig,
    /// Thresholds for the built-in rule gates.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Stage result forwarding.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// External test command.
    #[serde(default)]
    pub tests: TestCommandConfig,
}

impl VibeGateConfig {
    /// Creates a configuration with defaults rooted at `project_root`.
    #[must_use]
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathConfig {
                project_root: project_root.into(),
                ..PathConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// A relative `paths.project_root` is resolved against the directory
    /// containing the file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;

        if config.paths.project_root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.paths.project_root = base.join(&config.paths.project_root);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.impact.source_extension.is_empty() {
            return Err(VibeGateError::config("impact.source_extension must not be empty"));
        }
        if self.impact.module_separator.is_empty() {
            return Err(VibeGateError::config("impact.module_separator must not be empty"));
        }
        if self.notify.timeout_seconds <= 0.0 {
            return Err(VibeGateError::config("notify.timeout_seconds must be positive"));
        }
        if self.tests.timeout_seconds <= 0.0 {
            return Err(VibeGateError::config("tests.timeout_seconds must be positive"));
        }
        Ok(())
    }

    /// Sets the maximum reverse-import depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.impact.max_depth = depth;
        self
    }

    /// Sets the dashboard endpoint for stage notifications.
    #[must_use]
    pub fn with_notify_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.notify.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the external test command.
    #[must_use]
    pub fn with_test_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tests.command = argv.into_iter().map(Into::into).collect();
        self
    }
}

/// Project layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Root that module identifiers are derived from.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Source directory, relative to the project root.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Test directory, relative to the project root.
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,
    /// Directory for persisted state, relative to the project root.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Directory names skipped while walking source and test trees.
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("vibe-x/.state")
}

fn default_ignored_dirs() -> Vec<String> {
    [".git", "__pycache__", "node_modules", ".venv", "venv", "dist", "build"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            source_dir: default_source_dir(),
            tests_dir: default_tests_dir(),
            state_dir: default_state_dir(),
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

impl PathConfig {
    /// Absolute-ish source root (`project_root/source_dir`).
    #[must_use]
    pub fn source_root(&self) -> PathBuf {
        self.project_root.join(&self.source_dir)
    }

    /// Test root (`project_root/tests_dir`).
    #[must_use]
    pub fn tests_root(&self) -> PathBuf {
        self.project_root.join(&self.tests_dir)
    }

    /// Default location of the work-zone snapshot.
    #[must_use]
    pub fn zone_state_file(&self) -> PathBuf {
        self.project_root.join(&self.state_dir).join("work_zones.json")
    }
}

/// Impact analysis tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Maximum reverse-import expansion depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Extension of scanned source and test files, without the dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Separator joining path segments into a module identifier.
    #[serde(default = "default_module_separator")]
    pub module_separator: String,
    /// File name prefix identifying test files.
    #[serde(default = "default_test_file_prefix")]
    pub test_file_prefix: String,
}

fn default_max_depth() -> usize {
    3
}

fn default_source_extension() -> String {
    "py".to_string()
}

fn default_module_separator() -> String {
    ".".to_string()
}

fn default_test_file_prefix() -> String {
    "test_".to_string()
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            source_extension: default_source_extension(),
            module_separator: default_module_separator(),
            test_file_prefix: default_test_file_prefix(),
        }
    }
}

/// Thresholds for the built-in rule gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Longest allowed line.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Lines with trailing whitespace tolerated before a warning.
    #[serde(default = "default_max_trailing_whitespace_lines")]
    pub max_trailing_whitespace_lines: usize,
    /// Longest allowed Python function body.
    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,
    /// Substrings that must not appear in any line.
    #[serde(default = "default_forbidden_patterns")]
    pub forbidden_patterns: Vec<String>,
    /// Longest allowed file.
    #[serde(default = "default_max_file_lines")]
    pub max_file_lines: usize,
    /// Deepest allowed indentation level.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Most import statements allowed in one file.
    #[serde(default = "default_max_import_count")]
    pub max_import_count: usize,
    /// Layer directory name to rank; rank 0 is shared by every layer.
    #[serde(default = "default_layer_order")]
    pub layer_order: BTreeMap<String, u8>,
}

fn default_max_line_length() -> usize {
    200
}

fn default_max_trailing_whitespace_lines() -> usize {
    5
}

fn default_max_function_lines() -> usize {
    50
}

fn default_forbidden_patterns() -> Vec<String> {
    ["console.log", "# type: ignore", "noqa", "TODO: hack"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_lines() -> usize {
    500
}

fn default_max_nesting_depth() -> usize {
    5
}

fn default_max_import_count() -> usize {
    20
}

fn default_layer_order() -> BTreeMap<String, u8> {
    [
        ("shared", 0),
        ("layer1_scaffold", 1),
        ("layer2_rag", 2),
        ("layer3_agents", 3),
        ("layer4_collab", 4),
        ("layer5_dashboard", 5),
    ]
    .into_iter()
    .map(|(name, rank)| (name.to_string(), rank))
    .collect()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            max_trailing_whitespace_lines: default_max_trailing_whitespace_lines(),
            max_function_lines: default_max_function_lines(),
            forbidden_patterns: default_forbidden_patterns(),
            max_file_lines: default_max_file_lines(),
            max_nesting_depth: default_max_nesting_depth(),
            max_import_count: default_max_import_count(),
            layer_order: default_layer_order(),
        }
    }
}

/// Stage result forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Dashboard endpoint receiving gate results, if any.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Upper bound on a single forward.
    #[serde(default = "default_notify_timeout")]
    pub timeout_seconds: f64,
    /// Detail lines included in a forwarded payload.
    #[serde(default = "default_max_details")]
    pub max_details: usize,
}

fn default_notify_timeout() -> f64 {
    3.0
}

fn default_max_details() -> usize {
    20
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_notify_timeout(),
            max_details: default_max_details(),
        }
    }
}

impl NotifyConfig {
    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// External test command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCommandConfig {
    /// Command argv; the test file path is appended. Empty means tests
    /// are selected but not executed.
    #[serde(default)]
    pub command: Vec<String>,
    /// Per-file timeout.
    #[serde(default = "default_test_timeout")]
    pub timeout_seconds: f64,
}

fn default_test_timeout() -> f64 {
    120.0
}

impl Default for TestCommandConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_seconds: default_test_timeout(),
        }
    }
}

impl TestCommandConfig {
    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = VibeGateConfig::default();
        assert_eq!(config.impact.max_depth, 3);
        assert_eq!(config.impact.source_extension, "py");
        assert_eq!(config.rules.max_line_length, 200);
        assert_eq!(config.notify.timeout(), Duration::from_secs(3));
        assert_eq!(config.tests.timeout(), Duration::from_secs(120));
        assert!(config.rules.forbidden_patterns.contains(&"console.log".to_string()));
        assert_eq!(config.rules.layer_order.get("shared"), Some(&0));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: VibeGateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.paths.source_dir, PathBuf::from("src"));
        assert_eq!(config.impact.module_separator, ".");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config: VibeGateConfig =
            serde_json::from_str(r#"{"impact": {"max_depth": 1}, "rules": {"max_line_length": 120}}"#)
                .unwrap();
        assert_eq!(config.impact.max_depth, 1);
        assert_eq!(config.impact.source_extension, "py");
        assert_eq!(config.rules.max_line_length, 120);
        assert_eq!(config.rules.max_function_lines, 50);
    }

    #[test]
    fn test_for_project_paths() {
        let config = VibeGateConfig::for_project("/work/app");
        assert_eq!(config.paths.source_root(), PathBuf::from("/work/app/src"));
        assert_eq!(config.paths.tests_root(), PathBuf::from("/work/app/tests"));
        assert_eq!(
            config.paths.zone_state_file(),
            PathBuf::from("/work/app/vibe-x/.state/work_zones.json")
        );
    }

    #[test]
    fn test_from_json_file_resolves_relative_root() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("vibegate.json");
        std::fs::write(&file, r#"{"paths": {"project_root": "app"}}"#)?;

        let config = VibeGateConfig::from_json_file(&file)?;
        assert_eq!(config.paths.project_root, dir.path().join("app"));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_empty_extension() {
        let mut config = VibeGateConfig::default();
        config.impact.source_extension.clear();
        assert!(matches!(config.validate(), Err(VibeGateError::Config(_))));
    }

    #[test]
    fn test_builders() {
        let config = VibeGateConfig::default()
            .with_max_depth(5)
            .with_notify_endpoint("http://127.0.0.1:8000/api/gate-result")
            .with_test_command(["python", "-m", "pytest"]);
        assert_eq!(config.impact.max_depth, 5);
        assert!(config.notify.endpoint.is_some());
        assert_eq!(config.tests.command.len(), 3);
    }
}
