//! The work-zone registry service.

use super::{Collision, DeclareOutcome, WorkZone, ZoneAction, ZoneConflict, ZoneEvent};
use crate::config::VibeGateConfig;
use crate::core::{StageKind, StageResult};
use crate::events::EventSink;
use crate::utils::{format_iso8601, now_utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub(super) struct RegistryState {
    pub(super) zones: BTreeMap<String, WorkZone>,
    pub(super) history: Vec<ZoneEvent>,
}

/// Tracks which actor intends to modify which files.
///
/// Construct one per process and share it by `Arc`. Every operation takes
/// the internal lock once, so conflict computation and registration in
/// [`declare`](Self::declare) cannot interleave with another declaration.
pub struct WorkZoneRegistry {
    pub(super) state: Mutex<RegistryState>,
    project_root: Option<PathBuf>,
    sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for WorkZoneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkZoneRegistry")
            .field("zones", &self.state.lock().zones.len())
            .field("project_root", &self.project_root)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for WorkZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkZoneRegistry {
    /// Creates an empty registry that keys files exactly as given.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            project_root: None,
            sink: None,
        }
    }

    /// Creates an empty registry keyed relative to the configured root.
    #[must_use]
    pub fn for_config(config: &VibeGateConfig) -> Self {
        Self::new().with_project_root(&config.paths.project_root)
    }

    /// Keys files beneath `root` by their root-relative path.
    #[must_use]
    pub fn with_project_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.project_root = Some(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()));
        self
    }

    /// Publishes `zone.declared` / `zone.released` to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Normalizes a path into the key used for overlap checks.
    #[must_use]
    pub fn file_key(&self, path: &Path) -> String {
        let Some(root) = &self.project_root else {
            return join_components(path);
        };
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        absolute
            .strip_prefix(root)
            .map_or_else(|_| join_components(&absolute), join_components)
    }

    fn keys<I, P>(&self, files: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        files.into_iter().map(|f| self.file_key(f.as_ref())).collect()
    }

    /// Declares `actor`'s zone, replacing any previous one.
    ///
    /// Conflicts with other actors' active zones are computed first and
    /// returned; the zone is registered regardless.
    pub fn declare<I, P>(&self, actor: &str, files: I, description: &str) -> DeclareOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = self.keys(files);
        let zone = WorkZone::declared(actor, files, description);

        let outcome = {
            let mut state = self.state.lock();
            let conflicts = conflicts_for(&state.zones, actor, &zone.files);
            let outcome = DeclareOutcome {
                actor: actor.to_string(),
                file_count: zone.files.len(),
                conflicts,
            };
            state.history.push(ZoneEvent {
                action: ZoneAction::Declare,
                actor: actor.to_string(),
                conflict_count: outcome.conflicts.len(),
                timestamp: zone.declared_at,
            });
            state.zones.insert(actor.to_string(), zone.clone());
            outcome
        };

        if outcome.has_conflicts() {
            warn!(
                actor,
                conflicts = outcome.conflicts.len(),
                "work zone declared with conflicts"
            );
        } else {
            info!(actor, files = outcome.file_count, "work zone declared");
        }

        if let Some(sink) = &self.sink {
            sink.try_emit(
                "zone.declared",
                Some(json!({
                    "actor": actor,
                    "files": zone.files,
                    "description": zone.description,
                    "declared_at": format_iso8601(&zone.declared_at),
                    "conflicts": outcome.conflicts,
                })),
            );
        }
        outcome
    }

    /// Deactivates `actor`'s zone.
    ///
    /// Returns false, leaving the registry untouched, when the actor has
    /// no active zone.
    pub fn release(&self, actor: &str) -> bool {
        {
            let mut state = self.state.lock();
            match state.zones.get_mut(actor) {
                Some(zone) if zone.active => zone.active = false,
                _ => return false,
            }
            state.history.push(ZoneEvent {
                action: ZoneAction::Release,
                actor: actor.to_string(),
                conflict_count: 0,
                timestamp: now_utc(),
            });
        }

        info!(actor, "work zone released");
        if let Some(sink) = &self.sink {
            sink.try_emit("zone.released", Some(json!({ "actor": actor })));
        }
        true
    }

    /// Returns the zone registered for `actor`, active or not.
    #[must_use]
    pub fn zone(&self, actor: &str) -> Option<WorkZone> {
        self.state.lock().zones.get(actor).cloned()
    }

    /// Snapshot of active zones keyed by actor.
    #[must_use]
    pub fn active_zones(&self) -> BTreeMap<String, WorkZone> {
        self.state
            .lock()
            .zones
            .iter()
            .filter(|(_, zone)| zone.active)
            .map(|(actor, zone)| (actor.clone(), zone.clone()))
            .collect()
    }

    /// Inverted view: file key to the actors whose active zones claim it.
    #[must_use]
    pub fn active_zone_map(&self) -> BTreeMap<String, Vec<String>> {
        let state = self.state.lock();
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (actor, zone) in state.zones.iter().filter(|(_, z)| z.active) {
            for file in &zone.files {
                map.entry(file.clone()).or_default().push(actor.clone());
            }
        }
        map
    }

    /// Returns the declare/release history in order.
    #[must_use]
    pub fn history(&self) -> Vec<ZoneEvent> {
        self.state.lock().history.clone()
    }

    /// Files in `changed` that other actors' active zones claim.
    #[must_use]
    pub fn collisions<P: AsRef<Path>>(&self, changed: &[P], author: &str) -> Vec<Collision> {
        let changed = self.keys(changed);
        let state = self.state.lock();
        state
            .zones
            .iter()
            .filter(|(actor, zone)| actor.as_str() != author && zone.active)
            .flat_map(|(actor, zone)| {
                zone.overlap(&changed).into_iter().map(|file| Collision {
                    file,
                    actor: actor.clone(),
                    declared_at: zone.declared_at,
                })
            })
            .collect()
    }

    /// Gate-time collision check for the files being verified.
    ///
    /// Collisions are a coordination signal: the result is `Warning` when
    /// any exist and `Passed` otherwise, never `Failed`.
    #[must_use]
    pub fn check_collision<P: AsRef<Path>>(&self, changed: &[P], author: &str) -> StageResult {
        if changed.is_empty() {
            return StageResult::skipped(StageKind::Collision, "no changed files to check");
        }

        let collisions = self.collisions(changed, author);
        if collisions.is_empty() {
            return StageResult::passed(StageKind::Collision, "no collisions");
        }

        warn!(author, collisions = collisions.len(), "work zone collision detected");
        StageResult::warning(
            StageKind::Collision,
            format!("{} file collision(s) detected", collisions.len()),
        )
        .with_details(collisions.iter().map(Collision::detail))
    }

    pub(super) fn from_zones(zones: BTreeMap<String, WorkZone>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                zones,
                history: Vec::new(),
            }),
            project_root: None,
            sink: None,
        }
    }
}

fn conflicts_for(
    zones: &BTreeMap<String, WorkZone>,
    actor: &str,
    files: &BTreeSet<String>,
) -> Vec<ZoneConflict> {
    zones
        .iter()
        .filter(|(other, zone)| other.as_str() != actor && zone.active)
        .filter_map(|(other, zone)| {
            let overlapping_files = zone.overlap(files);
            (!overlapping_files.is_empty()).then(|| ZoneConflict {
                actor: other.clone(),
                overlapping_files,
                description: zone.description.clone(),
            })
        })
        .collect()
}

fn join_components(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
