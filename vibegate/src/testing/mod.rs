//! Testing utilities for gate chains.
//!
//! This module provides:
//! - Stub and recording gates
//! - A stub test runner
//! - Assertions over pipeline results

mod assertions;
mod mocks;

pub use assertions::{
    assert_overall, assert_stage_absent, assert_stage_detail, assert_stage_status,
    assert_stopped_at,
};
pub use mocks::{RecordedRun, RecordingGate, SlowGate, StaticGate, StubTestRunner};
