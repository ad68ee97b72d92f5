//! Chart descriptions and the rendering seam.
//!
//! The analysis prepares every chart as a [`ChartSpec`]: a kind tag, labels
//! and plain series data. A [`ChartRenderer`] turns specs into output. The
//! default [`PlottersRenderer`] writes PNG files; [`NoopRenderer`] is used
//! when charts are disabled.

pub mod layout;
mod plotters_renderer;

pub use layout::{BoxSummary, HistogramBin, histogram_bins};
pub use plotters_renderer::PlottersRenderer;

use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per category.
    Bar,
    /// Binned distribution of a single series.
    Histogram,
    /// Scatter plot with marginal histograms on both axes.
    JointScatter,
    /// Jittered points per category.
    Strip,
    /// Quartile box per category.
    Box,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Histogram => "histogram",
            Self::JointScatter => "joint_scatter",
            Self::Strip => "strip",
            Self::Box => "box",
        }
    }
}

/// Prepared data behind a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Label and value per bar, drawn in the given order.
    Categories(Vec<(String, f64)>),
    /// Raw values to bin, with an optional vertical marker (e.g. the mean).
    Distribution {
        values: Vec<f64>,
        bins: usize,
        marker: Option<f64>,
    },
    /// `(x, y)` points.
    Points(Vec<(f64, f64)>),
    /// Values grouped under a label, groups drawn in the given order.
    Groups(Vec<(String, Vec<f64>)>),
}

impl ChartData {
    /// Number of plotted values.
    pub fn len(&self) -> usize {
        match self {
            Self::Categories(bars) => bars.len(),
            Self::Distribution { values, .. } => values.len(),
            Self::Points(points) => points.len(),
            Self::Groups(groups) => groups.iter().map(|(_, values)| values.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
    /// Output file name without extension.
    pub file_stem: String,
}

/// Consumes chart specs and produces output.
pub trait ChartRenderer {
    /// Draw `spec`, returning the written file if there is one.
    fn render(&mut self, spec: &ChartSpec) -> Result<Option<PathBuf>>;
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl ChartRenderer for NoopRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<Option<PathBuf>> {
        tracing::debug!("Skipping chart '{}'", spec.title);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_data_len() {
        let groups = ChartData::Groups(vec![
            ("Free".to_string(), vec![1.0, 2.0]),
            ("Paid".to_string(), vec![3.0]),
        ]);
        assert_eq!(groups.len(), 3);
        assert!(ChartData::Points(Vec::new()).is_empty());
    }

    #[test]
    fn test_noop_renderer_writes_nothing() {
        let spec = ChartSpec {
            kind: ChartKind::Bar,
            title: "Apps per category".to_string(),
            x_label: "Category".to_string(),
            y_label: "Apps".to_string(),
            data: ChartData::Categories(vec![("GAME".to_string(), 3.0)]),
            file_stem: "category_counts".to_string(),
        };
        assert_eq!(NoopRenderer.render(&spec).unwrap(), None);
    }

    #[test]
    fn test_chart_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChartKind::JointScatter).unwrap(),
            "\"joint_scatter\""
        );
        assert_eq!(ChartKind::JointScatter.as_str(), "joint_scatter");
    }
}
