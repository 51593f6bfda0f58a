//! Gate trait and built-in gates.
//!
//! Every stage of the chain is a [`GateStage`]: one of six fixed kinds
//! that turns a [`GateContext`] into a [`StageResult`]. Gates never fail
//! with an error; missing input and unreadable files are reported as
//! `Skipped` results.

mod architecture;
mod collision;
mod context;
mod integration;
mod review;
mod rules;
mod syntax;

pub use architecture::ArchitectureGate;
pub use collision::CollisionGate;
pub use context::{GateContext, DEFAULT_AUTHOR};
pub use integration::IntegrationGate;
pub use review::ReviewGate;
pub use rules::RulesGate;
pub use syntax::SyntaxGate;

use crate::core::{StageKind, StageResult};
use async_trait::async_trait;
use std::fmt::Debug;

/// One verification stage.
#[async_trait]
pub trait GateStage: Send + Sync + Debug {
    /// The kind, which fixes the stage number.
    fn kind(&self) -> StageKind;

    /// The stage name reported in results.
    fn name(&self) -> &str {
        self.kind().display_name()
    }

    /// Runs the gate.
    async fn run(&self, ctx: &GateContext) -> StageResult;
}

/// A gate backed by a synchronous closure.
pub struct FnGate<F>
where
    F: Fn(&GateContext) -> StageResult + Send + Sync,
{
    kind: StageKind,
    func: F,
}

impl<F> FnGate<F>
where
    F: Fn(&GateContext) -> StageResult + Send + Sync,
{
    /// Creates a closure-backed gate of `kind`.
    pub const fn new(kind: StageKind, func: F) -> Self {
        Self { kind, func }
    }
}

impl<F> Debug for FnGate<F>
where
    F: Fn(&GateContext) -> StageResult + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnGate").field("kind", &self.kind).finish()
    }
}

#[async_trait]
impl<F> GateStage for FnGate<F>
where
    F: Fn(&GateContext) -> StageResult + Send + Sync,
{
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &GateContext) -> StageResult {
        (self.func)(ctx)
    }
}

/// Counts issues into the three-way status used by the rule gates:
/// none passes, up to `warn_limit` warns, more fails.
pub(crate) const fn tiered_status(issues: usize, warn_limit: usize) -> crate::core::GateStatus {
    use crate::core::GateStatus;
    if issues == 0 {
        GateStatus::Passed
    } else if issues <= warn_limit {
        GateStatus::Warning
    } else {
        GateStatus::Failed
    }
}

/// 1-based line number of byte offset `pos` in `content`.
pub(crate) fn line_of(content: &str, pos: usize) -> usize {
    content[..pos].matches('\n').count() + 1
}
