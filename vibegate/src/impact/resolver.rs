//! Module identifiers and reverse-import discovery.

use crate::config::VibeGateConfig;
use crate::errors::ScanError;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Frontier modules per compiled import matcher; keeps each `RegexSet`
/// well under the regex size limit.
const MATCHER_CHUNK: usize = 128;

/// Logical module identifier derived from a file path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Wraps an already-formed identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last segment, e.g. `login` for `auth.login`.
    #[must_use]
    pub fn last_segment(&self, separator: &str) -> &str {
        self.0.rsplit(separator).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Maps files to modules and finds who imports whom.
///
/// Import detection is textual: a file references a module when it
/// contains `from <module>`, `import <module>`, or a `from X import ...`
/// line naming the module's last segment as a whole word. Same-named
/// unrelated symbols therefore count as references.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    root: PathBuf,
    source_root: PathBuf,
    extension: String,
    separator: String,
    ignored_dirs: Vec<String>,
}

impl DependencyResolver {
    /// Creates a resolver for the configured project.
    #[must_use]
    pub fn new(config: &VibeGateConfig) -> Self {
        let root = canonical_or_self(&config.paths.project_root);
        let source_root = root.join(&config.paths.source_dir);
        Self {
            root,
            source_root,
            extension: config.impact.source_extension.clone(),
            separator: config.impact.module_separator.clone(),
            ignored_dirs: config.paths.ignored_dirs.clone(),
        }
    }

    /// Returns the (canonicalized) project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the module separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Resolves `path` against the project root when relative.
    #[must_use]
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        canonical_or_self(&joined)
    }

    /// Converts a file path into a module identifier.
    ///
    /// Returns `None` when the path does not lie under the project root
    /// or has no segments left once the extension is stripped.
    #[must_use]
    pub fn path_to_module(&self, path: &Path) -> Option<ModuleId> {
        let absolute = self.absolutize(path);
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let stem = relative.with_extension("");

        let segments: Vec<&str> = stem
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(ModuleId::new(segments.join(&self.separator)))
    }

    /// Breadth-first reverse-import expansion.
    ///
    /// Every level rescans the whole source tree for files referencing the
    /// current frontier. The returned set contains the targets plus every
    /// module found within `max_depth` levels.
    pub fn reverse_imports(
        &self,
        targets: &BTreeSet<ModuleId>,
        max_depth: usize,
    ) -> Result<BTreeSet<ModuleId>, ScanError> {
        let mut affected = targets.clone();
        if !self.source_root.is_dir() {
            debug!(source_root = %self.source_root.display(), "source root missing, skipping reverse-import scan");
            return Ok(affected);
        }

        let files = self.source_files(&self.source_root)?;
        let mut frontier = targets.clone();
        let mut depth = 0;

        while depth < max_depth && !frontier.is_empty() {
            let matchers = self.import_matchers(&frontier)?;
            let mut next = BTreeSet::new();

            for file in &files {
                let Some(module) = self.path_to_module(file) else {
                    continue;
                };
                if affected.contains(&module) {
                    continue;
                }
                let content = match std::fs::read_to_string(file) {
                    Ok(content) => content,
                    Err(err) => {
                        debug!(file = %file.display(), error = %err, "skipping unreadable source file");
                        continue;
                    }
                };
                if matchers.iter().any(|m| m.is_match(&content)) {
                    affected.insert(module.clone());
                    next.insert(module);
                }
            }

            debug!(depth, found = next.len(), "reverse-import level scanned");
            frontier = next;
            depth += 1;
        }

        Ok(affected)
    }

    fn import_matchers(&self, targets: &BTreeSet<ModuleId>) -> Result<Vec<RegexSet>, ScanError> {
        let targets: Vec<&ModuleId> = targets.iter().collect();
        targets
            .chunks(MATCHER_CHUNK)
            .map(|chunk| {
                let patterns = chunk.iter().map(|target| {
                    let full = regex::escape(target.as_str());
                    let short = regex::escape(target.last_segment(&self.separator));
                    format!(r"(?:from\s+{full}|import\s+{full}|from\s+\S+\s+import\s+.*\b{short}\b)")
                });
                RegexSet::new(patterns).map_err(|e| ScanError::new(&self.source_root, e.to_string()))
            })
            .collect()
    }

    /// Lists files with the configured extension under `dir`, sorted,
    /// skipping ignored directories.
    pub(crate) fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_ignored(entry.file_name().to_str().unwrap_or_default())
            });

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && self.has_source_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    pub(crate) fn has_source_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    pub(crate) fn extension(&self) -> &str {
        &self.extension
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
