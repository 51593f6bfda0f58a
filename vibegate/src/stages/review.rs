//! Gate 4: security, performance and complexity scan.

use super::{line_of, GateContext, GateStage};
use crate::config::RulesConfig;
use crate::core::{StageKind, StageResult};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

struct ReviewPattern {
    code: &'static str,
    description: &'static str,
    regex: Regex,
    /// A match followed (after optional whitespace) by this text is ignored.
    unless_followed_by: Option<&'static str>,
}

impl ReviewPattern {
    fn new(code: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            code,
            description,
            regex: Regex::new(pattern).expect("valid review pattern"),
            unless_followed_by: None,
        }
    }

    fn unless_followed_by(mut self, suffix: &'static str) -> Self {
        self.unless_followed_by = Some(suffix);
        self
    }

    fn findings(&self, content: &str) -> Vec<String> {
        self.regex
            .find_iter(content)
            .filter(|m| {
                self.unless_followed_by
                    .map_or(true, |suffix| !content[m.end()..].trim_start().starts_with(suffix))
            })
            .map(|m| format!("[{}] L{}: {}", self.code, line_of(content, m.start()), self.description))
            .collect()
    }
}

static SECURITY_PATTERNS: LazyLock<Vec<ReviewPattern>> = LazyLock::new(|| {
    vec![
        ReviewPattern::new(
            "SEC-001",
            "possible hardcoded secret",
            r#"(?i)(?:password|secret|api_key|token)\s*=\s*["'][^"']{8,}["']"#,
        ),
        ReviewPattern::new(
            "SEC-002",
            "eval/exec call (code injection risk)",
            r"\b(?:eval|exec)\s*\(",
        ),
        ReviewPattern::new(
            "SEC-003",
            "SQL built from a formatted string (injection risk)",
            r#"(?i)(?:execute|cursor\.)\w*\(\s*f?["'].*(?:SELECT|INSERT|UPDATE|DELETE)"#,
        ),
        ReviewPattern::new(
            "SEC-004",
            "subprocess with shell=True (command injection)",
            r"subprocess\.\w+\(.*shell\s*=\s*True",
        ),
        ReviewPattern::new(
            "SEC-005",
            "pickle deserialization (remote code execution)",
            r"pickle\.loads?\(",
        ),
        ReviewPattern::new(
            "SEC-006",
            "assert on user input (removed under optimization)",
            r"(?m)^\s*assert\s+.*\b(?:request|input|user)\b",
        ),
    ]
});

static PERFORMANCE_PATTERNS: LazyLock<Vec<ReviewPattern>> = LazyLock::new(|| {
    vec![
        ReviewPattern::new(
            "PERF-001",
            "query or request inside a loop (N+1)",
            r"for\s+\w+\s+in\s+.*:\s*\n\s+.*(?:query|fetch|request|get)\(",
        ),
        ReviewPattern::new(
            "PERF-002",
            "unbounded full data load",
            r"\.(?:find|select|query)\(\s*\)",
        )
        .unless_followed_by(".limit"),
        ReviewPattern::new("PERF-003", "blocking sleep", r"time\.sleep\(\s*\d{2,}"),
        ReviewPattern::new(
            "PERF-004",
            "loops nested three deep (O(n^3) or worse)",
            r"for\s+.*:\s*\n\s+for\s+.*:\s*\n\s+for\s+",
        ),
        ReviewPattern::new(
            "PERF-005",
            "copy of a large list",
            r"list\(\w+\).*len\(.*>\s*\d{4}",
        ),
    ]
});

/// Pattern scan for security and performance problems plus simple
/// complexity metrics.
///
/// Any security finding fails the gate; other findings warn.
#[derive(Debug, Clone)]
pub struct ReviewGate {
    max_file_lines: usize,
    max_nesting_depth: usize,
    max_import_count: usize,
}

impl ReviewGate {
    /// Creates the gate from the rule thresholds.
    #[must_use]
    pub const fn new(rules: &RulesConfig) -> Self {
        Self {
            max_file_lines: rules.max_file_lines,
            max_nesting_depth: rules.max_nesting_depth,
            max_import_count: rules.max_import_count,
        }
    }

    fn check_complexity(&self, content: &str) -> Vec<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let mut issues = Vec::new();

        if lines.len() > self.max_file_lines {
            issues.push(format!(
                "[CMPLX-001] file has {} lines (keep under {}, consider splitting)",
                lines.len(),
                self.max_file_lines
            ));
        }

        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let indent = &line[..line.len() - line.trim_start().len()];
            let width = indent.chars().count();
            let depth = if indent.contains("    ") { width / 4 } else { width / 2 };
            if depth >= self.max_nesting_depth {
                issues.push(format!("[CMPLX-002] L{}: nesting depth {depth}, refactor", i + 1));
                break;
            }
        }

        let imports = lines
            .iter()
            .filter(|l| {
                let t = l.trim();
                t.starts_with("import ") || t.starts_with("from ")
            })
            .count();
        if imports > self.max_import_count {
            issues.push(format!("[CMPLX-003] {imports} imports, too many dependencies"));
        }
        issues
    }
}

impl Default for ReviewGate {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[async_trait]
impl GateStage for ReviewGate {
    fn kind(&self) -> StageKind {
        StageKind::Scan
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        let content = match ctx.read_target(StageKind::Scan) {
            Ok(content) => content,
            Err(skipped) => return skipped,
        };

        let security: Vec<String> = SECURITY_PATTERNS.iter().flat_map(|p| p.findings(&content)).collect();
        let performance: Vec<String> =
            PERFORMANCE_PATTERNS.iter().flat_map(|p| p.findings(&content)).collect();
        let complexity = self.check_complexity(&content);

        if security.is_empty() && performance.is_empty() && complexity.is_empty() {
            return StageResult::passed(StageKind::Scan, "no security or performance issues");
        }

        let message = format!(
            "security:{} performance:{} complexity:{}",
            security.len(),
            performance.len(),
            complexity.len()
        );
        let result = if security.is_empty() {
            StageResult::warning(StageKind::Scan, message)
        } else {
            StageResult::failed(StageKind::Scan, message)
        };
        result.with_details(security.into_iter().chain(performance).chain(complexity))
    }
}
