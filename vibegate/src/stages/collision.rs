//! Gate 6: work-zone collisions.

use super::{GateContext, GateStage};
use crate::core::{StageKind, StageResult};
use crate::zones::WorkZoneRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// Checks the change set against other actors' active work zones.
#[derive(Debug, Clone)]
pub struct CollisionGate {
    registry: Arc<WorkZoneRegistry>,
}

impl CollisionGate {
    /// Creates the gate over a shared registry.
    #[must_use]
    pub const fn new(registry: Arc<WorkZoneRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this gate reads.
    #[must_use]
    pub const fn registry(&self) -> &Arc<WorkZoneRegistry> {
        &self.registry
    }
}

#[async_trait]
impl GateStage for CollisionGate {
    fn kind(&self) -> StageKind {
        StageKind::Collision
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        self.registry.check_collision(ctx.changed_files(), ctx.author())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GateStatus;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_collision_with_other_actor() {
        let registry = Arc::new(WorkZoneRegistry::new());
        registry.declare("bob", ["auth.py"], "refactor login");
        let gate = CollisionGate::new(Arc::clone(&registry));

        let result = gate.run(&GateContext::new("auth.py").with_author("alice")).await;
        assert_eq!(result.status(), GateStatus::Warning);
        assert_eq!(result.stage(), 6);
        assert!(result.has_detail("'bob'"));

        let own = gate.run(&GateContext::new("auth.py").with_author("bob")).await;
        assert_eq!(own.status(), GateStatus::Passed);
    }

    #[tokio::test]
    async fn test_empty_change_set_skipped() {
        let gate = CollisionGate::new(Arc::new(WorkZoneRegistry::new()));
        let ctx = GateContext::new("auth.py").with_changed_files(Vec::<PathBuf>::new());
        assert_eq!(gate.run(&ctx).await.status(), GateStatus::Skipped);
    }
}
