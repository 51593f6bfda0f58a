//! Impact analysis.
//!
//! This module provides:
//! - Path to module mapping and bounded reverse-import discovery
//! - Impact set computation and related-test selection
//! - The test execution collaborator

mod analyzer;
mod resolver;
mod runner;

pub use analyzer::{ImpactAnalyzer, ImpactReport};
pub use resolver::{DependencyResolver, ModuleId};
pub use runner::{CommandTestRunner, SelectionOnlyRunner, TestOutcome, TestRunner, TestVerdict};

#[cfg(test)]
pub use runner::MockTestRunner;
