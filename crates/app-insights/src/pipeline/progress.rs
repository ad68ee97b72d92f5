//! Progress reporting for the analysis pipeline.
//!
//! The pipeline runs synchronously; progress updates are emitted as each stage
//! starts and finishes so a caller can show where a run is or where it failed.
//!
//! # Example
//!
//! ```rust,ignore
//! use app_insights::AnalysisPipeline;
//!
//! let outcome = AnalysisPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Reading the apps and reviews tables
    Loading,
    /// Removing duplicate app rows
    Deduplicating,
    /// Stripping formatting characters and coercing to numbers
    Cleaning,
    /// Computing counts, averages and derived views
    Aggregating,
    /// Joining reviews onto apps
    Joining,
    /// Drawing charts
    Rendering,
    /// Assembling the report
    Reporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl AnalysisStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Deduplicating => "Removing Duplicates",
            Self::Cleaning => "Cleaning Columns",
            Self::Aggregating => "Aggregating",
            Self::Joining => "Joining Reviews",
            Self::Rendering => "Rendering Charts",
            Self::Reporting => "Generating Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall run (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.25,
            Self::Deduplicating => 0.05,
            Self::Cleaning => 0.05,
            Self::Aggregating => 0.10,
            Self::Joining => 0.10,
            Self::Rendering => 0.40,
            Self::Reporting => 0.05,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Deduplicating => 0.25,
            Self::Cleaning => 0.30,
            Self::Aggregating => 0.35,
            Self::Joining => 0.45,
            Self::Rendering => 0.55,
            Self::Reporting => 0.95,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: AnalysisStage,

    /// Optional sub-stage description (e.g., "Chart 3/8")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a progress update for item `current` of `total` within a stage.
    pub fn with_items(
        stage: AnalysisStage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(format!("{current}/{total}")),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during a run.
pub trait ProgressReporter: Send + Sync {
    /// Called when the pipeline enters or finishes a stage.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
