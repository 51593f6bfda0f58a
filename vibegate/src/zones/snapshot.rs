//! JSON snapshot of registry state.
//!
//! The snapshot is a wholesale dump, overwritten on every save:
//!
//! ```json
//! {
//!   "zones": { "bob": { "actor": "bob", "files": ["auth.py"], "description": "...",
//!                       "declared_at": "...", "is_active": true } },
//!   "saved_at": "..."
//! }
//! ```

use super::{WorkZone, WorkZoneRegistry};
use crate::config::VibeGateConfig;
use crate::errors::Result;
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Persisted registry state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// All zones, active or released, keyed by actor.
    pub zones: BTreeMap<String, WorkZone>,
    /// When the snapshot was taken.
    pub saved_at: Timestamp,
}

impl WorkZoneRegistry {
    /// Captures the current zones.
    #[must_use]
    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            zones: self.state.lock().zones.clone(),
            saved_at: now_utc(),
        }
    }

    /// Writes the snapshot to `path`, creating parent directories.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = self.snapshot();
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        info!(path = %path.display(), zones = snapshot.zones.len(), "work zone state saved");
        Ok(path.to_path_buf())
    }

    /// Restores a registry from a snapshot file. History is not persisted
    /// and starts empty.
    pub fn load_state(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let snapshot: ZoneSnapshot = serde_json::from_str(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the snapshot to the configured state file.
    pub fn save_state_for(&self, config: &VibeGateConfig) -> Result<PathBuf> {
        self.save_state(config.paths.zone_state_file())
    }

    /// Restores a registry from the configured state file, keyed against
    /// the configured project root.
    pub fn load_state_for(config: &VibeGateConfig) -> Result<Self> {
        let registry = Self::load_state(config.paths.zone_state_file())?;
        Ok(registry.with_project_root(&config.paths.project_root))
    }

    /// Builds a registry holding the snapshot's zones.
    #[must_use]
    pub fn from_snapshot(snapshot: ZoneSnapshot) -> Self {
        Self::from_zones(snapshot.zones)
    }
}
