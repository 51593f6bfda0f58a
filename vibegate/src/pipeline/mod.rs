//! Gate chain orchestration.
//!
//! This module provides:
//! - Per-stage fail policies and the continue/halt decision
//! - The validated chain builder
//! - Sequential execution and concurrent batch runs

mod integration_tests;
mod orchestrator;
mod policy;

pub use orchestrator::{GateChain, GateChainBuilder};
pub use policy::{FailPolicy, PolicyDecision, PolicyTable};
