//! Type conversion functions for data cleaning.
//!
//! Both conversions fail fast: the first value that cannot be coerced aborts
//! the whole column with an [`AnalysisError::Parse`] naming the row.

use crate::error::{AnalysisError, Result};
use crate::utils::parse_stripped;
use polars::prelude::*;

/// Convert a text series with optional values to Float64.
///
/// Nulls stay null. Any other value must parse as a float once trimmed.
pub(crate) fn text_to_optional_float(series: &Series) -> Result<Series> {
    let str_series = series.str()?;
    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for (row, opt_val) in str_series.into_iter().enumerate() {
        match opt_val {
            Some(val) => {
                let parsed = val
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| parse_error(row, series.name(), val))?;
                result_vec.push(Some(parsed));
            }
            None => result_vec.push(None),
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Strip formatting characters from a text series and convert it to Float64.
///
/// Every value must be present and must parse to a finite, non-negative number
/// once `chars` are removed.
pub(crate) fn strip_and_parse(series: &Series, chars: &[char]) -> Result<Series> {
    let str_series = series.str()?;
    let mut result_vec: Vec<f64> = Vec::with_capacity(str_series.len());

    for (row, opt_val) in str_series.into_iter().enumerate() {
        let Some(val) = opt_val else {
            return Err(parse_error(row, series.name(), "<missing>"));
        };

        match parse_stripped(val, chars) {
            Some(number) if number.is_finite() && number >= 0.0 => result_vec.push(number),
            _ => return Err(parse_error(row, series.name(), val)),
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

fn parse_error(row: usize, column: &PlSmallStr, value: &str) -> AnalysisError {
    AnalysisError::Parse {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}
