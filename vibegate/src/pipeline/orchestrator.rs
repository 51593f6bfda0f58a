//! Sequential gate chain execution.

use super::{FailPolicy, PolicyDecision, PolicyTable};
use crate::config::VibeGateConfig;
use crate::core::{GateStatus, PipelineResult, StageKind};
use crate::errors::{Result, VibeGateError};
use crate::events::StageNotifier;
use crate::observability::SpanTimer;
use crate::stages::{
    ArchitectureGate, CollisionGate, GateContext, GateStage, IntegrationGate, ReviewGate, RulesGate,
    SyntaxGate,
};
use crate::zones::WorkZoneRegistry;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for a validated [`GateChain`].
#[derive(Debug, Default)]
pub struct GateChainBuilder {
    stages: Vec<Arc<dyn GateStage>>,
    policies: PolicyTable,
    notifier: StageNotifier,
    project_root: Option<PathBuf>,
}

impl GateChainBuilder {
    /// Creates an empty builder with the default policy table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a gate.
    #[must_use]
    pub fn stage(self, gate: impl GateStage + 'static) -> Self {
        self.shared_stage(Arc::new(gate))
    }

    /// Appends an already shared gate.
    #[must_use]
    pub fn shared_stage(mut self, gate: Arc<dyn GateStage>) -> Self {
        self.stages.push(gate);
        self
    }

    /// Replaces the policy table.
    #[must_use]
    pub fn policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    /// Sets the policy of one stage.
    pub fn policy(mut self, stage: u8, policy: FailPolicy) -> Result<Self> {
        self.policies.set(stage, policy)?;
        Ok(self)
    }

    /// Sets the notifier stage results are forwarded to.
    #[must_use]
    pub fn notifier(mut self, notifier: StageNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Resolves relative targets and changed files against `root`.
    #[must_use]
    pub fn project_root(mut self, root: impl AsRef<Path>) -> Self {
        self.project_root = Some(canonical_root(root.as_ref()));
        self
    }

    /// Validates and builds the chain.
    ///
    /// # Errors
    ///
    /// Fails if the chain is empty, or a stage number is repeated, out of
    /// order or outside `1..=6`.
    pub fn build(self) -> Result<GateChain> {
        if self.stages.is_empty() {
            return Err(VibeGateError::chain("gate chain has no stages"));
        }

        let mut seen = HashSet::new();
        let mut previous = 0;
        for gate in &self.stages {
            let number = gate.kind().number();
            if StageKind::from_number(number).is_none() {
                return Err(VibeGateError::InvalidStage(number));
            }
            if !seen.insert(number) {
                return Err(VibeGateError::chain(format!(
                    "stage {number} ('{}') appears more than once",
                    gate.name()
                )));
            }
            if number < previous {
                return Err(VibeGateError::chain(format!(
                    "stage {number} ('{}') is out of order after stage {previous}",
                    gate.name()
                )));
            }
            previous = number;
        }

        Ok(GateChain {
            stages: self.stages,
            policies: self.policies,
            notifier: self.notifier,
            project_root: self.project_root,
        })
    }
}

/// An ordered chain of gates with per-stage fail policies.
///
/// Stages within one run execute strictly in order. A `Failed` stage
/// under [`FailPolicy::Stop`] ends the run; every other outcome moves on
/// to the next stage.
#[derive(Debug, Clone)]
pub struct GateChain {
    stages: Vec<Arc<dyn GateStage>>,
    policies: PolicyTable,
    notifier: StageNotifier,
    project_root: Option<PathBuf>,
}

impl GateChain {
    /// Returns a builder for a custom chain.
    #[must_use]
    pub fn builder() -> GateChainBuilder {
        GateChainBuilder::new()
    }

    /// Wires the six built-in gates for `config`, sharing `registry` with
    /// whoever declares work zones.
    #[must_use]
    pub fn standard(config: &VibeGateConfig, registry: Arc<WorkZoneRegistry>) -> Self {
        Self {
            stages: vec![
                Arc::new(SyntaxGate::new(&config.rules)),
                Arc::new(RulesGate::new(&config.rules)),
                Arc::new(IntegrationGate::from_config(config)),
                Arc::new(ReviewGate::new(&config.rules)),
                Arc::new(ArchitectureGate::new(config)),
                Arc::new(CollisionGate::new(registry)),
            ],
            policies: PolicyTable::default(),
            notifier: configured_notifier(config),
            project_root: Some(canonical_root(&config.paths.project_root)),
        }
    }

    /// Overrides the policy of one stage for subsequent runs.
    pub fn set_policy(&mut self, stage: u8, policy: FailPolicy) -> Result<()> {
        self.policies.set(stage, policy)
    }

    /// Returns the policy table.
    #[must_use]
    pub const fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Replaces the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: StageNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Stage numbers in execution order.
    #[must_use]
    pub fn stage_numbers(&self) -> Vec<u8> {
        self.stages.iter().map(|g| g.kind().number()).collect()
    }

    /// Runs every stage against `ctx`.
    ///
    /// With a project root, relative paths in `ctx` resolve against it
    /// before any gate runs.
    pub async fn run(&self, ctx: &GateContext) -> PipelineResult {
        let resolved;
        let ctx = match &self.project_root {
            Some(root) => {
                resolved = ctx.resolved_against(root);
                &resolved
            }
            None => ctx,
        };
        let timer = SpanTimer::start("gate_chain");
        let mut result = PipelineResult::new(ctx.run_id());
        info!(
            run_id = %ctx.run_id(),
            target = %ctx.target().display(),
            author = ctx.author(),
            stages = self.stages.len(),
            "gate chain started"
        );

        for gate in &self.stages {
            let stage_timer = SpanTimer::start(gate.name());
            let outcome = gate.run(ctx).await;
            let stage = outcome.stage();
            let status = outcome.status();
            let policy = self.policies.get(stage);
            debug!(
                stage,
                name = gate.name(),
                status = %status,
                elapsed_ms = stage_timer.elapsed_ms(),
                "stage completed"
            );

            self.notifier.forward(&outcome, ctx.target());
            result.push(outcome);

            match PolicyDecision::decide(status, policy) {
                PolicyDecision::Halt => {
                    warn!(stage, policy = %policy, "stage failed, halting gate chain");
                    result.halt(stage);
                    break;
                }
                PolicyDecision::Bypass => {
                    info!(stage, policy = %policy, "stage failed, bypassed");
                }
                PolicyDecision::Continue if status == GateStatus::Failed => {
                    info!(stage, policy = %policy, "stage failed, continuing");
                }
                PolicyDecision::Continue => {}
            }
        }

        result.finalize();
        result.set_elapsed(timer.finish());
        info!(
            run_id = %ctx.run_id(),
            overall = %result.overall_status(),
            stopped_at = ?result.stopped_at(),
            elapsed_ms = result.elapsed().as_secs_f64() * 1000.0,
            "gate chain finished"
        );
        result
    }

    /// Runs independent contexts concurrently; each run is sequential.
    pub async fn run_batch(&self, contexts: &[GateContext]) -> Vec<PipelineResult> {
        join_all(contexts.iter().map(|ctx| self.run(ctx))).await
    }
}

fn canonical_root(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

#[cfg(feature = "dashboard")]
fn configured_notifier(config: &VibeGateConfig) -> StageNotifier {
    use crate::events::DashboardEventSink;

    if config.notify.endpoint.is_none() {
        return StageNotifier::logging(&config.notify);
    }
    match DashboardEventSink::from_config(&config.notify) {
        Ok(sink) => StageNotifier::new(Arc::new(sink), &config.notify),
        Err(err) => {
            warn!(error = %err, "dashboard notifier unavailable, logging stage results instead");
            StageNotifier::logging(&config.notify)
        }
    }
}

#[cfg(not(feature = "dashboard"))]
fn configured_notifier(config: &VibeGateConfig) -> StageNotifier {
    StageNotifier::logging(&config.notify)
}
