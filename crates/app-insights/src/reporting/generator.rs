use crate::charts::ChartKind;
use crate::error::Result;
use crate::joiner::JoinSummary;
use crate::types::{CategoryCounts, ColumnStats, PricedApp};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the JSON report inside the output directory.
pub const REPORT_FILE_NAME: &str = "analysis_report.json";

/// Everything computed by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the apps table
    pub apps_file: String,
    /// Path to the reviews table
    pub reviews_file: String,
    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Table sizes before and after deduplication
    pub dataset: DatasetSummary,
    /// Cleaned apps columns with type and non-null count
    pub columns: Vec<ColumnInfo>,
    /// Random sample of cleaned apps
    pub sample_apps: Vec<SampleApp>,

    // Aggregates
    pub category_counts: CategoryCounts,
    pub average_rating: f64,
    /// Descriptive statistics of the numeric columns that have values
    pub column_stats: Vec<ColumnStats>,
    /// Price above which apps are listed in `premium_apps`
    pub premium_price_threshold: f64,
    pub premium_apps: Vec<PricedApp>,

    /// Row counts of the derived views
    pub views: DerivedViews,
    /// Row accounting of the reviews join
    pub join: JoinSummary,

    /// Charts in drawing order
    pub charts: Vec<ChartRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub apps_loaded: usize,
    pub duplicates_removed: usize,
    /// Apps left after deduplication
    pub total_apps: usize,
    pub reviews_loaded: usize,
}

/// Name, type and non-null count of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleApp {
    pub app: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub installs: f64,
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub price: f64,
}

/// Row counts of the views feeding the charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DerivedViews {
    pub rated_and_sized: usize,
    pub large_categories: usize,
    pub paid_apps: usize,
    pub popular_categories: usize,
    pub affordable_popular: usize,
    pub premium_apps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub kind: ChartKind,
    pub title: String,
    /// Rendered file, absent when charts are disabled
    pub file: Option<String>,
}

/// Serialises and writes analysis reports.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(report: &AnalysisReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Write the report as `<output_dir>/analysis_report.json`.
    pub fn write_report_to_file(&self, report: &AnalysisReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(REPORT_FILE_NAME);
        let mut file = File::create(&report_path)?;
        file.write_all(Self::to_json(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
