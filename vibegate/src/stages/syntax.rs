//! Gate 1: structural checks.

use super::{GateContext, GateStage};
use crate::config::RulesConfig;
use crate::core::{StageKind, StageResult};
use async_trait::async_trait;

/// Flags empty files, overlong lines, mixed indentation and trailing
/// whitespace. Findings only ever warn.
#[derive(Debug, Clone)]
pub struct SyntaxGate {
    max_line_length: usize,
    max_trailing_whitespace_lines: usize,
}

impl SyntaxGate {
    /// Creates the gate from the rule thresholds.
    #[must_use]
    pub const fn new(rules: &RulesConfig) -> Self {
        Self {
            max_line_length: rules.max_line_length,
            max_trailing_whitespace_lines: rules.max_trailing_whitespace_lines,
        }
    }

    fn check(&self, content: &str) -> Vec<String> {
        let mut issues = Vec::new();
        let lines: Vec<&str> = content.split('\n').collect();

        if content.trim().is_empty() {
            issues.push("empty file".to_string());
        }

        for (i, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            if len > self.max_line_length {
                issues.push(format!(
                    "L{}: line length {len} (over {})",
                    i + 1,
                    self.max_line_length
                ));
            }
        }

        let has_tabs = lines.iter().any(|l| l.contains('\t'));
        let has_spaces = lines.iter().any(|l| l.starts_with("  "));
        if has_tabs && has_spaces {
            issues.push("mixed tab and space indentation".to_string());
        }

        let trailing = lines
            .iter()
            .filter(|l| !l.trim().is_empty() && l.len() != l.trim_end().len())
            .count();
        if trailing > self.max_trailing_whitespace_lines {
            issues.push(format!("trailing whitespace on {trailing} lines"));
        }

        issues
    }
}

impl Default for SyntaxGate {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[async_trait]
impl GateStage for SyntaxGate {
    fn kind(&self) -> StageKind {
        StageKind::Syntax
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        let content = match ctx.read_target(StageKind::Syntax) {
            Ok(content) => content,
            Err(skipped) => return skipped,
        };

        let issues = self.check(&content);
        if issues.is_empty() {
            StageResult::passed(StageKind::Syntax, "no structural issues")
        } else {
            StageResult::warning(StageKind::Syntax, format!("{} structural issue(s)", issues.len()))
                .with_details(issues)
        }
    }
}
