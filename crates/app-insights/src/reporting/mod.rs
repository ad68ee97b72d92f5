//! Report generation module.
//!
//! An [`AnalysisReport`] collects everything a run computed: table sizes,
//! column types, aggregates, derived-view row counts, join accounting and the
//! charts that were drawn. It is used for:
//! - the human-readable console summary (default CLI output)
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//!
//! # Example
//!
//! ```rust,ignore
//! use app_insights::reporting::ReportGenerator;
//!
//! let outcome = pipeline.run()?;
//! println!("{}", ReportGenerator::to_json(&outcome.report)?);
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.write_report_to_file(&outcome.report)?;
//! ```

mod generator;

pub use generator::{
    AnalysisReport, ChartRecord, ColumnInfo, DatasetSummary, DerivedViews, REPORT_FILE_NAME,
    ReportGenerator, SampleApp,
};
