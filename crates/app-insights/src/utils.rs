//! Shared utilities for the analysis pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::error::{AnalysisError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Text values read as missing, matching the usual CSV conventions.
static MISSING_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["", "NaN", "nan", "NA", "N/A", "null", "None"]
        .into_iter()
        .collect()
});

/// Check if a raw text value stands for a missing value.
///
/// Whitespace-only values count as missing.
///
/// # Example
///
/// ```rust,ignore
/// use app_insights::utils::is_missing_marker;
///
/// assert!(is_missing_marker("NaN"));
/// assert!(is_missing_marker("   "));
/// assert!(!is_missing_marker("0"));
/// ```
pub fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    MISSING_MARKERS.contains(trimmed)
}

/// Remove every occurrence of every character in `chars` from `s`.
///
/// # Example
///
/// ```rust,ignore
/// use app_insights::utils::strip_chars;
///
/// assert_eq!(strip_chars("10,000+", &['+', ',', '$']), "10000");
/// assert_eq!(strip_chars("$4.99", &['+', ',', '$']), "4.99");
/// ```
pub fn strip_chars(s: &str, chars: &[char]) -> String {
    s.chars().filter(|c| !chars.contains(c)).collect()
}

/// Strip `chars` from `s` and parse the rest as a float.
///
/// Returns `None` for empty or unparsable text.
pub fn parse_stripped(s: &str, chars: &[char]) -> Option<f64> {
    let stripped = strip_chars(s, chars);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

// =============================================================================
// Column Access Utilities
// =============================================================================

/// Look up a column, mapping absence to [`AnalysisError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| AnalysisError::ColumnNotFound(name.to_string()))
}

/// Borrow a text column as a `StringChunked`.
pub fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    Ok(require_column(df, name)?.as_materialized_series().str()?)
}

/// Read a column as floats, keeping nulls.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Read a text column as owned strings, keeping nulls.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    Ok(str_column(df, name)?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
