//! Impact set computation and related-test selection.

use super::{DependencyResolver, ModuleId};
use crate::config::VibeGateConfig;
use crate::errors::ScanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of analysing one change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// The changed files, as given.
    pub changed_files: Vec<PathBuf>,
    /// Modules transitively affected, including the changed modules.
    pub impacted: BTreeSet<ModuleId>,
    /// Test files selected for the change.
    pub related_tests: BTreeSet<PathBuf>,
}

impl ImpactReport {
    /// Returns true if at least one related test was found.
    #[must_use]
    pub fn has_tests(&self) -> bool {
        !self.related_tests.is_empty()
    }
}

/// Computes impact sets and selects the tests that cover them.
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    resolver: DependencyResolver,
    tests_root: PathBuf,
    test_prefix: String,
    max_depth: usize,
}

impl ImpactAnalyzer {
    /// Creates an analyzer for the configured project.
    #[must_use]
    pub fn new(config: &VibeGateConfig) -> Self {
        let resolver = DependencyResolver::new(config);
        let tests_root = resolver.root().join(&config.paths.tests_dir);
        Self {
            resolver,
            tests_root,
            test_prefix: config.impact.test_file_prefix.clone(),
            max_depth: config.impact.max_depth,
        }
    }

    /// Returns the underlying resolver.
    #[must_use]
    pub const fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Computes the modules affected by `changed_files`.
    ///
    /// The result always contains the module of every changed file that
    /// lies under the project root.
    pub fn analyze_impact(&self, changed_files: &[PathBuf]) -> Result<BTreeSet<ModuleId>, ScanError> {
        let seeds: BTreeSet<ModuleId> = changed_files
            .iter()
            .filter_map(|f| self.resolver.path_to_module(f))
            .collect();
        self.resolver.reverse_imports(&seeds, self.max_depth)
    }

    /// Selects test files by naming convention and by content scan.
    pub fn find_related_tests(
        &self,
        changed_files: &[PathBuf],
        impacted: &BTreeSet<ModuleId>,
    ) -> Result<BTreeSet<PathBuf>, ScanError> {
        let mut tests: BTreeSet<PathBuf> = changed_files
            .iter()
            .flat_map(|f| self.naming_candidates(f))
            .filter(|c| c.is_file())
            .collect();

        if self.tests_root.is_dir() {
            for file in self.resolver.source_files(&self.tests_root)? {
                if tests.contains(&file) || !self.is_test_file(&file) {
                    continue;
                }
                if self.imports_any(&file, impacted) {
                    tests.insert(file);
                }
            }
        }
        Ok(tests)
    }

    /// Runs both operations and bundles the result.
    pub fn report(&self, changed_files: &[PathBuf]) -> Result<ImpactReport, ScanError> {
        let impacted = self.analyze_impact(changed_files)?;
        let related_tests = self.find_related_tests(changed_files, &impacted)?;
        debug!(
            impacted = impacted.len(),
            tests = related_tests.len(),
            "impact analysis complete"
        );
        Ok(ImpactReport {
            changed_files: changed_files.to_vec(),
            impacted,
            related_tests,
        })
    }

    fn naming_candidates(&self, changed: &Path) -> Vec<PathBuf> {
        let absolute = self.resolver.absolutize(changed);
        let Some(stem) = absolute.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        let ext = self.resolver.extension();
        let prefix = &self.test_prefix;
        let parent = absolute.parent().unwrap_or(self.resolver.root());

        vec![
            parent.join(format!("{prefix}{stem}.{ext}")),
            parent.join(format!("{stem}_test.{ext}")),
            self.tests_root.join(format!("{prefix}{stem}.{ext}")),
            self.tests_root.join(format!("{prefix}{}.{ext}", stem.replace('_', ""))),
        ]
    }

    fn is_test_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&self.test_prefix))
    }

    fn imports_any(&self, test_file: &Path, impacted: &BTreeSet<ModuleId>) -> bool {
        let Ok(content) = std::fs::read_to_string(test_file) else {
            debug!(file = %test_file.display(), "skipping unreadable test file");
            return false;
        };
        let separator = self.resolver.separator();
        impacted.iter().any(|module| {
            let full = module.as_str();
            let short = module.last_segment(separator);
            content.contains(&format!("import {full}"))
                || content.contains(&format!("from {full}"))
                || content.contains(&format!("import {short}"))
        })
    }
}
