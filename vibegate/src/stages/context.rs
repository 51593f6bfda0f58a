//! Per-run input shared by every gate.

use crate::core::{StageKind, StageResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Actor assumed when none is supplied.
pub const DEFAULT_AUTHOR: &str = "current";

/// What a pipeline run verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateContext {
    target: PathBuf,
    changed_files: Vec<PathBuf>,
    author: String,
    run_id: Uuid,
}

impl GateContext {
    /// Creates a context for `target`. The changed-file set defaults to
    /// the target alone and the author to [`DEFAULT_AUTHOR`].
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        Self {
            changed_files: vec![target.clone()],
            target,
            author: DEFAULT_AUTHOR.to_string(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Replaces the changed-file set used by the impact and collision gates.
    #[must_use]
    pub fn with_changed_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.changed_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the actor whose own work zone is excluded from collision checks.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Overrides the run identifier.
    #[must_use]
    pub const fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// The primary file under verification.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// All files in the change.
    #[must_use]
    pub fn changed_files(&self) -> &[PathBuf] {
        &self.changed_files
    }

    /// The verifying actor.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// The run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Resolves the relative target and changed files against `root`.
    #[must_use]
    pub fn resolved_against(&self, root: &Path) -> Self {
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            }
        };
        Self {
            target: resolve(&self.target),
            changed_files: self.changed_files.iter().map(resolve).collect(),
            author: self.author.clone(),
            run_id: self.run_id,
        }
    }

    /// Reads the target as UTF-8.
    ///
    /// A missing or unreadable target becomes a `Skipped` result for `kind`.
    pub fn read_target(&self, kind: StageKind) -> Result<String, StageResult> {
        if !self.target.is_file() {
            return Err(StageResult::skipped(kind, "target file not found")
                .with_details([self.target.display().to_string()]));
        }
        std::fs::read_to_string(&self.target).map_err(|err| {
            StageResult::skipped(kind, format!("cannot read target: {err}"))
                .with_details([self.target.display().to_string()])
        })
    }
}
