//! Data sanitization functions for raw text values.

use crate::error::Result;
use crate::utils::{column_names, is_missing_marker};
use polars::prelude::*;
use tracing::debug;

/// Replace missing-value markers with nulls in every text column.
///
/// Returns the sanitized frame and the number of replaced values.
pub(crate) fn replace_missing_markers(df: DataFrame) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let mut total_replacements = 0;

    for col_name in &column_names(&df) {
        let (cleaned_series, count) = {
            let series = df.column(col_name)?.as_materialized_series();
            if series.dtype() != &DataType::String {
                continue;
            }
            replace_markers_in_series(series)?
        };

        if count > 0 {
            total_replacements += count;
            df.replace(col_name, cleaned_series)?;
        }
    }

    if total_replacements > 0 {
        debug!("Replaced {} missing-value markers with null", total_replacements);
    }

    Ok((df, total_replacements))
}

/// Replace missing-value markers in a single text series.
pub(crate) fn replace_markers_in_series(series: &Series) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut cleaned_values = Vec::with_capacity(str_series.len());
    let mut replacement_count = 0;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) if is_missing_marker(val) => {
                cleaned_values.push(None);
                replacement_count += 1;
            }
            Some(val) => cleaned_values.push(Some(val)),
            None => cleaned_values.push(None),
        }
    }

    Ok((
        Series::new(series.name().clone(), cleaned_values),
        replacement_count,
    ))
}
