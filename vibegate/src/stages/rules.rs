//! Gate 2: team coding rules.

use super::{tiered_status, GateContext, GateStage};
use crate::config::RulesConfig;
use crate::core::{GateStatus, StageKind, StageResult};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static MAGIC_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[=<>]\s*\d{3,}").expect("valid magic-number regex"));

static PY_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(async\s+)?def\s+(\w+)").expect("valid def regex"));

const CODE_EXTENSIONS: [&str; 5] = ["py", "ts", "tsx", "js", "jsx"];
const WARN_LIMIT: usize = 3;

/// Checks forbidden patterns, magic numbers, `: any` in TypeScript and
/// Python function length.
///
/// Up to three findings warn; more fail.
#[derive(Debug, Clone)]
pub struct RulesGate {
    forbidden_patterns: Vec<String>,
    max_function_lines: usize,
}

impl RulesGate {
    /// Creates the gate from the rule thresholds.
    #[must_use]
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            forbidden_patterns: rules.forbidden_patterns.clone(),
            max_function_lines: rules.max_function_lines,
        }
    }

    fn check(&self, content: &str, extension: &str) -> Vec<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let mut issues = Vec::new();

        for pattern in &self.forbidden_patterns {
            for (i, line) in lines.iter().enumerate() {
                if line.contains(pattern.as_str()) {
                    issues.push(format!("L{}: forbidden pattern '{pattern}'", i + 1));
                }
            }
        }

        if CODE_EXTENSIONS.contains(&extension) {
            let typescript = matches!(extension, "ts" | "tsx");
            for (i, line) in lines.iter().enumerate() {
                let stripped = line.trim();
                if MAGIC_NUMBER.is_match(stripped) && !stripped.to_lowercase().contains("port") {
                    issues.push(format!("L{}: possible magic number, extract a constant", i + 1));
                }
                if typescript && stripped.contains(": any") {
                    issues.push(format!("L{}: 'any' type, use a concrete type or 'unknown'", i + 1));
                }
            }
        }

        if extension == "py" {
            issues.extend(self.check_function_length(&lines));
        }
        issues
    }

    fn check_function_length(&self, lines: &[&str]) -> Vec<String> {
        let starts: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                PY_FUNCTION
                    .captures(line)
                    .and_then(|c| c.get(3))
                    .map(|name| (i, name.as_str()))
            })
            .collect();

        let content_end = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1);

        starts
            .iter()
            .enumerate()
            .filter_map(|(n, &(start, name))| {
                let end = starts.get(n + 1).map_or(content_end, |&(next, _)| next);
                let length = end.saturating_sub(start);
                (length > self.max_function_lines).then(|| {
                    format!(
                        "L{}: '{name}' is {length} lines (max {})",
                        start + 1,
                        self.max_function_lines
                    )
                })
            })
            .collect()
    }
}

impl Default for RulesGate {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[async_trait]
impl GateStage for RulesGate {
    fn kind(&self) -> StageKind {
        StageKind::Rules
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        let content = match ctx.read_target(StageKind::Rules) {
            Ok(content) => content,
            Err(skipped) => return skipped,
        };
        let extension = extension_of(ctx.target());

        let issues = self.check(&content, extension);
        let status = tiered_status(issues.len(), WARN_LIMIT);
        let message = match status {
            GateStatus::Passed => "coding rules satisfied".to_string(),
            GateStatus::Warning => format!("{} rule issue(s)", issues.len()),
            _ => format!("{} rule violations", issues.len()),
        };
        StageResult::new(StageKind::Rules, status, message).with_details(issues)
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or_default()
}
