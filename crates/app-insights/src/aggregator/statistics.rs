//! Descriptive statistics over numeric columns.

use crate::error::{AnalysisError, Result};
use crate::types::ColumnStats;
use polars::prelude::*;

/// Compute count, mean, sample standard deviation and quartiles of a series.
///
/// Nulls are counted but otherwise ignored.
pub(crate) fn describe_series(series: &Series) -> Result<ColumnStats> {
    let float_series = series.cast(&DataType::Float64)?;
    let mut values: Vec<f64> = float_series.f64()?.into_iter().flatten().collect();

    if values.is_empty() {
        return Err(AnalysisError::EmptyInput(format!(
            "statistics of column '{}'",
            series.name()
        )));
    }

    values.sort_by(|a, b| a.total_cmp(b));

    Ok(ColumnStats {
        column: series.name().to_string(),
        count: values.len(),
        null_count: series.null_count(),
        mean: mean(&values),
        std: calculate_std(&values),
        min: values[0],
        q1: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q3: quantile_sorted(&values, 0.75),
        max: values[values.len() - 1],
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn calculate_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }

    let mean = mean(values);
    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Quantile of already sorted values with linear interpolation between ranks.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let weight = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}
