//! Core domain model types for vibegate.
//!
//! This module contains the fundamental types shared by every gate:
//! - Gate status, overall status and stage kind enums
//! - The immutable per-stage result
//! - The aggregated pipeline result and its wire report

mod pipeline_result;
mod result;
mod status;

pub use pipeline_result::{PipelineReport, PipelineResult};
pub use result::StageResult;
pub use status::{GateStatus, OverallStatus, StageKind};
