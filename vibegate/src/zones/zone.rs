//! Work-zone records.

use crate::utils::{format_iso8601, now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One actor's declared claim over a set of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkZone {
    /// Actor identifier.
    pub actor: String,
    /// Claimed file keys.
    pub files: BTreeSet<String>,
    /// Free-text description of the work.
    #[serde(default)]
    pub description: String,
    /// When the zone was declared.
    pub declared_at: Timestamp,
    /// False once released.
    #[serde(rename = "is_active")]
    pub active: bool,
}

impl WorkZone {
    pub(crate) fn declared(actor: &str, files: BTreeSet<String>, description: &str) -> Self {
        Self {
            actor: actor.to_string(),
            files,
            description: description.to_string(),
            declared_at: now_utc(),
            active: true,
        }
    }

    /// Files shared with `other`, sorted.
    #[must_use]
    pub fn overlap(&self, other: &BTreeSet<String>) -> Vec<String> {
        self.files.intersection(other).cloned().collect()
    }
}

/// An overlap found when declaring a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConflict {
    /// The other actor.
    pub actor: String,
    /// Files both zones claim.
    pub overlapping_files: Vec<String>,
    /// The other actor's description.
    pub description: String,
}

/// Result of a declaration. Declaring always succeeds; conflicts are
/// informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareOutcome {
    /// The declaring actor.
    pub actor: String,
    /// Number of distinct files declared.
    pub file_count: usize,
    /// Overlaps with other actors' active zones.
    pub conflicts: Vec<ZoneConflict>,
}

impl DeclareOutcome {
    /// Returns true if any other active zone overlapped.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// A file being verified that another actor has claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// The contested file key.
    pub file: String,
    /// The actor holding the zone.
    pub actor: String,
    /// When that actor declared the zone.
    pub declared_at: Timestamp,
}

impl Collision {
    /// Detail line used in gate results.
    #[must_use]
    pub fn detail(&self) -> String {
        format!(
            "[COLLISION] '{}' - '{}' is also modifying it (declared at: {})",
            self.file,
            self.actor,
            format_iso8601(&self.declared_at)
        )
    }
}

/// Kind of registry history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneAction {
    /// A zone was declared.
    Declare,
    /// A zone was released.
    Release,
}

/// Registry history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEvent {
    /// What happened.
    pub action: ZoneAction,
    /// Who did it.
    pub actor: String,
    /// Conflicts reported, for declarations.
    pub conflict_count: usize,
    /// When.
    pub timestamp: Timestamp,
}
