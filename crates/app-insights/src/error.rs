//! Custom error types for the analysis pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. The three
//! domain failures are loading (`Load` / `MissingColumns`), numeric coercion
//! (`Parse`) and aggregation over nothing (`EmptyInput`); everything else wraps
//! a lower-level library error.
//!
//! Errors are serializable so they can be emitted as part of a JSON report.

use crate::pipeline::AnalysisStage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input file missing, unreadable, malformed or empty.
    #[error("Failed to load '{}': {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// Input file lacks one or more required columns.
    #[error("File '{}' is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// A cleaned text value could not be coerced to a number.
    #[error("Cannot parse '{value}' as a number in column '{column}' at row {row}")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    /// An aggregate was requested over zero eligible rows.
    #[error("No eligible rows for {0}")]
    EmptyInput(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chart rendering failed.
    #[error("Failed to render chart: {0}")]
    Render(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error tagged with the pipeline stage it was raised in.
    #[error("{} stage failed: {source}", .stage.display_name())]
    InStage {
        stage: AnalysisStage,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Tag this error with the stage that produced it.
    ///
    /// An error that already carries a stage keeps the innermost one.
    pub fn in_stage(self, stage: AnalysisStage) -> Self {
        match self {
            tagged @ AnalysisError::InStage { .. } => tagged,
            other => AnalysisError::InStage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error was raised in, if known.
    pub fn stage(&self) -> Option<AnalysisStage> {
        match self {
            Self::InStage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The untagged error underneath any stage annotation.
    pub fn root(&self) -> &AnalysisError {
        match self {
            Self::InStage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } | Self::MissingColumns { .. } => "LOAD_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Render(_) => "RENDER_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::InStage { source, .. } => source.error_code(),
        }
    }

    /// Check if this error means an input table could not be loaded.
    pub fn is_load_error(&self) -> bool {
        self.error_code() == "LOAD_ERROR"
    }
}

/// Errors are serialized as a struct with `code`, `stage` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("stage", &self.stage())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for tagging results with a pipeline stage.
pub trait ResultExt<T> {
    /// Attach the stage to an error result.
    fn in_stage(self, stage: AnalysisStage) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_stage(self, stage: AnalysisStage) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error() -> AnalysisError {
        AnalysisError::Parse {
            row: 3,
            column: "Price".to_string(),
            value: "free".to_string(),
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(parse_error().error_code(), "PARSE_ERROR");
        assert_eq!(
            AnalysisError::EmptyInput("mean rating".to_string()).error_code(),
            "EMPTY_INPUT"
        );
        assert_eq!(
            AnalysisError::MissingColumns {
                path: PathBuf::from("apps.csv"),
                columns: vec!["Price".to_string()],
            }
            .error_code(),
            "LOAD_ERROR"
        );
    }

    #[test]
    fn test_parse_error_names_row_and_column() {
        let msg = parse_error().to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("'Price'"));
        assert!(msg.contains("'free'"));
    }

    #[test]
    fn test_in_stage_preserves_code_and_innermost_stage() {
        let error = parse_error()
            .in_stage(AnalysisStage::Cleaning)
            .in_stage(AnalysisStage::Aggregating);

        assert_eq!(error.stage(), Some(AnalysisStage::Cleaning));
        assert_eq!(error.error_code(), "PARSE_ERROR");
        assert!(matches!(error.root(), AnalysisError::Parse { row: 3, .. }));
        assert!(error.to_string().starts_with("Cleaning Columns stage failed"));
    }

    #[test]
    fn test_is_load_error() {
        let error = AnalysisError::Load {
            path: PathBuf::from("missing.csv"),
            reason: "file not found".to_string(),
        }
        .in_stage(AnalysisStage::Loading);
        assert!(error.is_load_error());
        assert!(!parse_error().is_load_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = parse_error().in_stage(AnalysisStage::Cleaning);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("PARSE_ERROR"));
        assert!(json.contains("\"cleaning\""));
        assert!(json.contains("Price"));
    }

    #[test]
    fn test_result_ext_tags_error_results() {
        let failed: Result<()> = Err(AnalysisError::ColumnNotFound("Price".to_string()));
        let tagged = failed.in_stage(AnalysisStage::Cleaning).unwrap_err();
        assert_eq!(tagged.stage(), Some(AnalysisStage::Cleaning));
        assert_eq!(tagged.error_code(), "COLUMN_NOT_FOUND");

        let ok: Result<u8> = Ok(1);
        assert_eq!(ok.in_stage(AnalysisStage::Loading).unwrap(), 1);
    }
}
