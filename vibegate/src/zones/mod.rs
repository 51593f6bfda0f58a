//! Work-zone declarations and collision detection.

mod registry;
mod snapshot;
mod zone;

pub use registry::WorkZoneRegistry;
pub use snapshot::ZoneSnapshot;
pub use zone::{Collision, DeclareOutcome, WorkZone, ZoneAction, ZoneConflict, ZoneEvent};
