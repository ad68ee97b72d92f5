//! Data cleaning module for the apps table.
//!
//! This module provides functionality for:
//! - Removing fully duplicate rows
//! - Stripping formatting characters from text columns and coercing them to numbers
//! - Normalising missing-value markers and applying declared column types

pub(crate) mod converters;
pub(crate) mod sanitizers;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use tracing::{debug, info};

/// Result of removing duplicate rows.
#[derive(Debug, Clone)]
pub struct DeduplicationOutcome {
    pub data: DataFrame,
    pub duplicates_removed: usize,
}

/// Removes rows that are identical across every column.
pub struct Deduplicator;

impl Deduplicator {
    /// Keep the first occurrence of every distinct row, in original order.
    ///
    /// Nulls compare equal to each other, so two rows missing the same
    /// values are still duplicates.
    pub fn remove_duplicates(df: &DataFrame) -> Result<DeduplicationOutcome> {
        let before = df.height();
        let data = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        let duplicates_removed = before - data.height();

        if duplicates_removed > 0 {
            let pct = (duplicates_removed as f64 / before as f64) * 100.0;
            info!(
                "Removed {} duplicate rows ({:.1}%)",
                duplicates_removed, pct
            );
        } else {
            debug!("No duplicate rows found");
        }

        Ok(DeduplicationOutcome {
            data,
            duplicates_removed,
        })
    }
}

/// Strips formatting characters from text columns and converts them to Float64.
#[derive(Debug, Clone)]
pub struct ColumnCleaner {
    columns: Vec<String>,
    chars: Vec<char>,
}

impl ColumnCleaner {
    pub fn new<I, S>(columns: I, chars: impl IntoIterator<Item = char>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            chars: chars.into_iter().collect(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.columns_to_clean.iter().cloned(),
            config.chars_to_strip.iter().copied(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return a cleaned copy of `df`; the input frame is left untouched.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::ColumnNotFound`] if a configured column is absent and
    /// [`AnalysisError::Parse`] for the first value that is missing, not a
    /// number, negative or infinite after stripping.
    pub fn clean(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut cleaned = df.clone();

        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| AnalysisError::ColumnNotFound(col_name.clone()))?;
            let series = column.as_materialized_series();

            let converted = if is_numeric_dtype(series.dtype()) {
                // Already numeric: route through text so the same checks apply.
                let as_text = series.cast(&DataType::String)?;
                converters::strip_and_parse(&as_text, &self.chars)?
            } else {
                converters::strip_and_parse(series, &self.chars)?
            };

            cleaned.replace(col_name, converted)?;
            debug!("Cleaned column {} ({} values)", col_name, cleaned.height());
        }

        info!(
            "Stripped {:?} from {:?} and converted to numeric",
            self.chars, self.columns
        );
        Ok(cleaned)
    }
}
