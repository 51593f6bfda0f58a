//! Per-stage fail policies.

use crate::core::{GateStatus, StageKind};
use crate::errors::{Result, VibeGateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a `Failed` status does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Halt the run and fail it.
    Stop,
    /// Keep going; the failure still counts toward the overall status.
    #[default]
    Warn,
    /// Keep going and log the bypass.
    Bypass,
}

impl fmt::Display for FailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Warn => write!(f, "warn"),
            Self::Bypass => write!(f, "bypass"),
        }
    }
}

/// How the orchestrator proceeds after a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Run the next stage.
    Continue,
    /// Stop the run here.
    Halt,
    /// Run the next stage, recording that a failure was bypassed.
    Bypass,
}

impl PolicyDecision {
    /// Applies `policy` to a stage outcome.
    ///
    /// Only a `Failed` status consults the policy; `Passed`, `Skipped` and
    /// `Warning` always continue.
    #[must_use]
    pub const fn decide(status: GateStatus, policy: FailPolicy) -> Self {
        match (status, policy) {
            (GateStatus::Failed, FailPolicy::Stop) => Self::Halt,
            (GateStatus::Failed, FailPolicy::Bypass) => Self::Bypass,
            _ => Self::Continue,
        }
    }
}

/// The fail policy of each stage number.
///
/// Stages 1 and 2 default to [`FailPolicy::Stop`], the rest to
/// [`FailPolicy::Warn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    policies: BTreeMap<u8, FailPolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let policies = StageKind::ALL
            .iter()
            .map(|kind| {
                let policy = if kind.number() <= 2 { FailPolicy::Stop } else { FailPolicy::Warn };
                (kind.number(), policy)
            })
            .collect();
        Self { policies }
    }
}

impl PolicyTable {
    /// Sets the policy of `stage`.
    pub fn set(&mut self, stage: u8, policy: FailPolicy) -> Result<()> {
        if StageKind::from_number(stage).is_none() {
            return Err(VibeGateError::InvalidStage(stage));
        }
        self.policies.insert(stage, policy);
        Ok(())
    }

    /// Returns the policy of `stage`, [`FailPolicy::Warn`] when unset.
    #[must_use]
    pub fn get(&self, stage: u8) -> FailPolicy {
        self.policies.get(&stage).copied().unwrap_or_default()
    }

    /// Iterates over `(stage, policy)` pairs in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, FailPolicy)> + '_ {
        self.policies.iter().map(|(stage, policy)| (*stage, *policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_policies() {
        let table = PolicyTable::default();
        let policies: Vec<(u8, FailPolicy)> = table.iter().collect();
        assert_eq!(
            policies,
            vec![
                (1, FailPolicy::Stop),
                (2, FailPolicy::Stop),
                (3, FailPolicy::Warn),
                (4, FailPolicy::Warn),
                (5, FailPolicy::Warn),
                (6, FailPolicy::Warn),
            ]
        );
    }

    #[test]
    fn test_set_rejects_unknown_stage() {
        let mut table = PolicyTable::default();
        assert!(matches!(table.set(0, FailPolicy::Stop), Err(VibeGateError::InvalidStage(0))));
        assert!(matches!(table.set(7, FailPolicy::Stop), Err(VibeGateError::InvalidStage(7))));
        table.set(4, FailPolicy::Stop).unwrap();
        assert_eq!(table.get(4), FailPolicy::Stop);
    }

    #[test]
    fn test_decisions() {
        use GateStatus::{Failed, Passed, Skipped, Warning};
        for policy in [FailPolicy::Stop, FailPolicy::Warn, FailPolicy::Bypass] {
            for status in [Passed, Skipped, Warning] {
                assert_eq!(PolicyDecision::decide(status, policy), PolicyDecision::Continue);
            }
        }
        assert_eq!(PolicyDecision::decide(Failed, FailPolicy::Stop), PolicyDecision::Halt);
        assert_eq!(PolicyDecision::decide(Failed, FailPolicy::Warn), PolicyDecision::Continue);
        assert_eq!(PolicyDecision::decide(Failed, FailPolicy::Bypass), PolicyDecision::Bypass);
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&PolicyTable::default()).unwrap();
        assert!(json.contains("\"1\":\"stop\""));
        let table: PolicyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, PolicyTable::default());
    }
}
