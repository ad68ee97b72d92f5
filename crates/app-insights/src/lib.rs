//! App Store Exploratory Analysis Library
//!
//! Exploratory analysis of an app store catalogue and its user reviews, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! A run goes through a fixed sequence of stages:
//!
//! - **Loading**: Read the apps and reviews CSV tables and check their columns
//! - **Deduplication**: Drop app rows that are identical across every column
//! - **Cleaning**: Strip `+`, `,` and `$` from `Installs` and `Price` and parse them as numbers
//! - **Aggregation**: Category counts, average rating, column statistics and derived views
//! - **Join**: Inner-join reviews onto apps and drop incomplete reviews
//! - **Charts**: Eight PNG charts drawn with plotters
//! - **Reporting**: A serializable summary of everything above
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use app_insights::{AnalysisConfig, AnalysisPipeline};
//!
//! let config = AnalysisConfig::builder()
//!     .apps_path("datasets/apps.csv")
//!     .reviews_path("datasets/user_reviews.csv")
//!     .output_dir("outputs")
//!     .build()?;
//!
//! let outcome = AnalysisPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("Total number of apps in the dataset = {}", outcome.report.dataset.total_apps);
//! println!("Average app rating = {:.4}", outcome.report.average_rating);
//! ```
//!
//! # Custom Renderers
//!
//! Charts go through the [`charts::ChartRenderer`] trait. [`charts::PlottersRenderer`]
//! writes PNG files and [`charts::NoopRenderer`] draws nothing; any other
//! implementation can be passed to [`AnalysisPipeline::run_with_renderer`]:
//!
//! ```rust,ignore
//! use app_insights::charts::{ChartRenderer, ChartSpec};
//! use std::path::PathBuf;
//!
//! struct TitleCollector(Vec<String>);
//!
//! impl ChartRenderer for TitleCollector {
//!     fn render(&mut self, spec: &ChartSpec) -> app_insights::Result<Option<PathBuf>> {
//!         self.0.push(spec.title.clone());
//!         Ok(None)
//!     }
//! }
//! ```
//!
//! # Errors
//!
//! Every failure of a run is an [`AnalysisError`] tagged with the
//! [`AnalysisStage`] it was raised in:
//!
//! ```rust,ignore
//! match pipeline.run() {
//!     Ok(outcome) => println!("{} charts", outcome.report.charts.len()),
//!     Err(e) => println!("[{:?}] {}", e.stage(), e),
//! }
//! ```

pub mod aggregator;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod joiner;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregator::{AppPredicate, Aggregator};
pub use charts::{ChartKind, ChartRenderer, ChartSpec, NoopRenderer, PlottersRenderer};
pub use cleaner::{ColumnCleaner, DeduplicationOutcome, Deduplicator};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{AnalysisError, Result, ResultExt};
pub use joiner::{JoinOutcome, JoinSummary, ReviewJoiner};
pub use loader::DatasetLoader;
pub use pipeline::{
    AnalysisOutcome, AnalysisPipeline, AnalysisPipelineBuilder, AnalysisStage,
    ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use reporting::{AnalysisReport, ReportGenerator};
pub use types::{CategoryCounts, ColumnStats, PricedApp, TableSchema};
