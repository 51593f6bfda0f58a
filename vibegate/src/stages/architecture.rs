//! Gate 5: layering, directory and naming rules.

use super::{tiered_status, GateContext, GateStage};
use crate::config::VibeGateConfig;
use crate::core::{StageKind, StageResult};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PACKAGE_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"from\s+(\w+)\.(\w+)").expect("valid import regex"));

static CLASS_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^class\s+(\w+)").expect("valid class regex"));

static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid snake_case regex"));

static PASCAL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]+$").expect("valid PascalCase regex"));

const WARN_LIMIT: usize = 3;

/// Enforces the layer order, layer directory placement and naming.
///
/// A layer may import its own layer, lower layers and the shared layer
/// (rank 0). More than three findings fail the gate; fewer warn.
#[derive(Debug, Clone)]
pub struct ArchitectureGate {
    project_root: PathBuf,
    source_dir: String,
    layer_order: BTreeMap<String, u8>,
}

impl ArchitectureGate {
    /// Creates the gate for the configured project.
    #[must_use]
    pub fn new(config: &VibeGateConfig) -> Self {
        let root = &config.paths.project_root;
        Self {
            project_root: root.canonicalize().unwrap_or_else(|_| root.clone()),
            source_dir: config.paths.source_dir.to_string_lossy().into_owned(),
            layer_order: config.rules.layer_order.clone(),
        }
    }

    fn relative_parts(&self, path: &Path) -> Vec<String> {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let relative = absolute.strip_prefix(&self.project_root).unwrap_or(&absolute);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    }

    fn check_layer_dependencies(&self, parts: &[String], content: &str) -> Vec<String> {
        let Some((layer, current)) = parts
            .iter()
            .find_map(|p| self.layer_order.get(p).map(|rank| (p, *rank)))
        else {
            return Vec::new();
        };
        if current == 0 {
            return Vec::new();
        }

        PACKAGE_IMPORT
            .captures_iter(content)
            .filter(|c| c[1] == *self.source_dir)
            .filter_map(|c| {
                let imported = c[2].to_string();
                let rank = *self.layer_order.get(&imported)?;
                (rank != 0 && rank > current).then(|| {
                    format!(
                        "[ARCH-001] layer dependency violation: {layer}(L{current}) -> {imported}(L{rank}) (cannot import a higher layer)"
                    )
                })
            })
            .collect()
    }

    fn check_structure(&self, parts: &[String]) -> Vec<String> {
        let Some(idx) = parts.iter().position(|p| *p == self.source_dir) else {
            return Vec::new();
        };
        match parts.get(idx + 1) {
            Some(sub) if !self.layer_order.contains_key(sub) && sub != "__pycache__" => {
                vec![format!("[ARCH-002] directory structure violation: '{sub}' is not a layer directory")]
            }
            _ => Vec::new(),
        }
    }

    fn check_naming(path: &Path, content: &str) -> Vec<String> {
        let mut issues = Vec::new();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let is_python = path.extension().is_some_and(|e| e == "py");

        if is_python && stem != "__init__" && !SNAKE_CASE.is_match(stem) {
            issues.push(format!("[ARCH-003] file name '{stem}' must be snake_case"));
        }
        for caps in CLASS_DEF.captures_iter(content) {
            let name = &caps[1];
            if !PASCAL_CASE.is_match(name) {
                issues.push(format!("[ARCH-004] class name '{name}' must be PascalCase"));
            }
        }
        issues
    }

    fn check(&self, path: &Path, content: &str) -> Vec<String> {
        let parts = self.relative_parts(path);
        let mut issues = self.check_layer_dependencies(&parts, content);
        issues.extend(self.check_structure(&parts));
        issues.extend(Self::check_naming(path, content));
        issues
    }
}

#[async_trait]
impl GateStage for ArchitectureGate {
    fn kind(&self) -> StageKind {
        StageKind::Architecture
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        let content = match ctx.read_target(StageKind::Architecture) {
            Ok(content) => content,
            Err(skipped) => return skipped,
        };

        let issues = self.check(ctx.target(), &content);
        let status = tiered_status(issues.len(), WARN_LIMIT);
        let message = if issues.is_empty() {
            "architecture rules satisfied".to_string()
        } else {
            format!("{} architecture issue(s)", issues.len())
        };
        StageResult::new(StageKind::Architecture, status, message).with_details(issues)
    }
}
