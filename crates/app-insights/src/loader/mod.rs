//! CSV loading with declared per-column types.
//!
//! Every column is first read as text so that the raw values survive
//! untouched for duplicate detection and cleaning. Missing-value markers are
//! then turned into nulls and the columns declared as
//! [`ColumnKind::OptionalFloat`] are converted to `Float64`.

use crate::cleaner::{converters, sanitizers};
use crate::error::{AnalysisError, Result};
use crate::types::{ColumnKind, TableSchema};
use crate::utils::column_names;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads delimited files into DataFrames according to a [`TableSchema`].
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load the table at `path` and apply `schema`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Load`] if the file is missing, unreadable, not valid
    ///   CSV or has no data rows
    /// - [`AnalysisError::MissingColumns`] if a required column is absent
    /// - [`AnalysisError::Parse`] if a declared float column holds text
    pub fn load(path: &Path, schema: &TableSchema) -> Result<DataFrame> {
        info!("Loading {} table from: {}", schema.name, path.display());

        if !path.is_file() {
            return Err(load_error(path, "file not found"));
        }

        let raw = read_text_csv(path)?;
        if raw.height() == 0 {
            return Err(load_error(path, "file contains no data rows"));
        }

        Self::check_required_columns(path, &raw, schema)?;

        let (df, nulls) = sanitizers::replace_missing_markers(raw)?;
        debug!("{} missing markers normalised in {}", nulls, schema.name);

        let df = Self::apply_schema(df, schema)?;
        info!("{} table loaded: {:?}", schema.name, df.shape());
        Ok(df)
    }

    fn check_required_columns(path: &Path, df: &DataFrame, schema: &TableSchema) -> Result<()> {
        let present = column_names(df);
        let missing: Vec<String> = schema
            .required_columns()
            .filter(|name| !present.iter().any(|p| p == name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            })
        }
    }

    /// Convert declared float columns; text and category columns stay as read.
    fn apply_schema(df: DataFrame, schema: &TableSchema) -> Result<DataFrame> {
        let mut df = df;

        for spec in &schema.columns {
            if spec.kind != ColumnKind::OptionalFloat {
                continue;
            }
            let converted = match df.column(&spec.name) {
                Ok(column) => converters::text_to_optional_float(column.as_materialized_series())?,
                // Only optional columns can be absent at this point.
                Err(_) => continue,
            };
            df.replace(&spec.name, converted)?;
            debug!("Column {} typed as {}", spec.name, spec.kind.as_str());
        }

        Ok(df)
    }
}

/// Read a CSV file with every column as text.
///
/// Ragged rows are rejected rather than truncated.
fn read_text_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
        .map_err(|e| load_error(path, e.to_string()))
}

fn load_error(path: &Path, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::Load {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
