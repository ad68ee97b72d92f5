//! Pipeline module.
//!
//! This module provides the analysis pipeline and its progress reporting.

mod builder;
mod chart_plan;
pub mod progress;

pub use builder::{AnalysisOutcome, AnalysisPipeline, AnalysisPipelineBuilder};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
