//! # Vibegate
//!
//! Staged, policy-driven verification of code changes.
//!
//! A change is pushed through a fixed chain of six gates:
//!
//! - **Syntax** and **Rules**: structural checks and team coding rules
//! - **Impact**: reverse-import analysis and related-test selection
//! - **Review**: security, performance and complexity patterns
//! - **Architecture**: layering, directory and naming rules
//! - **Collision**: overlap with other actors' declared work zones
//!
//! Each stage carries a fail policy (`Stop`, `Warn` or `Bypass`) that
//! decides whether a failure halts the run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vibegate::prelude::*;
//! use std::sync::Arc;
//!
//! let config = VibeGateConfig::for_project(".");
//! let registry = Arc::new(WorkZoneRegistry::for_config(&config));
//! registry.declare("bob", ["src/auth.py"], "refactor login");
//!
//! let mut chain = GateChain::standard(&config, Arc::clone(&registry));
//! chain.set_policy(4, FailPolicy::Stop)?;
//!
//! let result = chain.run(&GateContext::new("src/auth.py")).await;
//! println!("{}", result.summary());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod impact;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;
pub mod zones;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::VibeGateConfig;
    pub use crate::core::{
        GateStatus, OverallStatus, PipelineResult, StageKind, StageResult,
    };
    pub use crate::errors::{Result, ScanError, VibeGateError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, StageNotifier};
    pub use crate::impact::{ImpactAnalyzer, ModuleId, TestRunner};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{FailPolicy, GateChain, GateChainBuilder, PolicyTable};
    pub use crate::stages::{FnGate, GateContext, GateStage};
    pub use crate::zones::WorkZoneRegistry;
}
