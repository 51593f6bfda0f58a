//! Gate status, overall status and stage kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of verification a stage performs.
///
/// The chain is a closed set of six kinds; each kind owns a fixed
/// ordinal that doubles as its position in the standard chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Structural checks: encoding, empty files, long lines, indentation.
    Syntax,
    /// Team coding rules: forbidden patterns, magic numbers, function length.
    Rules,
    /// Impact analysis and related test selection.
    Impact,
    /// Security and performance pattern scan.
    Scan,
    /// Layering, directory and naming rules.
    Architecture,
    /// Work-zone collision check.
    Collision,
}

impl StageKind {
    /// All kinds in chain order.
    pub const ALL: [Self; 6] = [
        Self::Syntax,
        Self::Rules,
        Self::Impact,
        Self::Scan,
        Self::Architecture,
        Self::Collision,
    ];

    /// Returns the stage ordinal (1..=6).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Syntax => 1,
            Self::Rules => 2,
            Self::Impact => 3,
            Self::Scan => 4,
            Self::Architecture => 5,
            Self::Collision => 6,
        }
    }

    /// Looks up a kind by its ordinal.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Syntax),
            2 => Some(Self::Rules),
            3 => Some(Self::Impact),
            4 => Some(Self::Scan),
            5 => Some(Self::Architecture),
            6 => Some(Self::Collision),
            _ => None,
        }
    }

    /// Returns the human-facing stage name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Syntax => "Syntax Agent",
            Self::Rules => "Rules Agent",
            Self::Impact => "Integration Agent",
            Self::Scan => "Review Agent",
            Self::Architecture => "Architecture Agent",
            Self::Collision => "Collision Agent",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Rules => write!(f, "rules"),
            Self::Impact => write!(f, "impact"),
            Self::Scan => write!(f, "scan"),
            Self::Architecture => write!(f, "architecture"),
            Self::Collision => write!(f, "collision"),
        }
    }
}

/// The outcome status of a single gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// The gate found nothing to report.
    Passed,
    /// The gate found advisory issues.
    Warning,
    /// The gate found blocking issues.
    Failed,
    /// The gate could not run (missing input or unreadable file).
    Skipped,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Warning => write!(f, "warning"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl GateStatus {
    /// Returns true if the gate did not report a problem.
    #[must_use]
    pub const fn is_clean(self) -> bool {
        matches!(self, Self::Passed | Self::Skipped)
    }

    /// Returns true if the gate failed.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// The single status summarising a whole pipeline run.
///
/// Precedence is `Failed` > `Warning` > `Passed`; skipped gates do not
/// contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// No gate warned or failed.
    #[default]
    Passed,
    /// At least one gate warned and none failed.
    Warning,
    /// At least one gate failed.
    Failed,
}

impl OverallStatus {
    /// Rolls a sequence of gate statuses up into one overall status.
    ///
    /// The result does not depend on the order of `statuses`.
    pub fn rollup<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = GateStatus>,
    {
        statuses
            .into_iter()
            .map(|status| match status {
                GateStatus::Failed => Self::Failed,
                GateStatus::Warning => Self::Warning,
                GateStatus::Passed | GateStatus::Skipped => Self::Passed,
            })
            .max()
            .unwrap_or_default()
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Warning => write!(f, "warning"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
