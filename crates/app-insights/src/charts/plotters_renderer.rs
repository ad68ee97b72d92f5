//! PNG chart rendering with `plotters`.

use super::layout::{BoxSummary, HistogramBin, histogram_bins, padded_range};
use super::{ChartData, ChartKind, ChartRenderer, ChartSpec};
use crate::error::{AnalysisError, Result};
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MARGINAL_BINS: usize = 20;
const STRIP_JITTER: f64 = 0.3;
const BOX_HALF_WIDTH: f64 = 0.3;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Draws each chart into `<output_dir>/<file_stem>.png`.
pub struct PlottersRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
    rng: StdRng,
}

impl PlottersRenderer {
    /// Create the renderer, creating `output_dir` if needed.
    ///
    /// `seed` fixes the horizontal jitter of strip charts.
    pub fn new(output_dir: impl Into<PathBuf>, size: (u32, u32), seed: Option<u64>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            output_dir,
            size,
            rng,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn draw(&mut self, path: &Path, spec: &ChartSpec) -> anyhow::Result<()> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        match (&spec.kind, &spec.data) {
            (ChartKind::Bar, ChartData::Categories(bars)) => draw_bars(&root, spec, bars)?,
            (
                ChartKind::Histogram,
                ChartData::Distribution {
                    values,
                    bins,
                    marker,
                },
            ) => draw_histogram(&root, spec, &histogram_bins(values, *bins), *marker)?,
            (ChartKind::JointScatter, ChartData::Points(points)) => {
                draw_joint_scatter(&root, spec, points)?
            }
            (ChartKind::Strip, ChartData::Groups(groups)) => {
                draw_strip(&root, spec, groups, &mut self.rng)?
            }
            (ChartKind::Box, ChartData::Groups(groups)) => draw_box(&root, spec, groups)?,
            (kind, _) => anyhow::bail!("{} chart given incompatible data", kind.as_str()),
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<Option<PathBuf>> {
        let path = self.output_dir.join(format!("{}.png", spec.file_stem));
        debug!(
            "Rendering {} chart '{}' ({} values)",
            spec.kind.as_str(),
            spec.title,
            spec.data.len()
        );

        if !data_matches(spec.kind, &spec.data) {
            return Err(AnalysisError::Render(format!(
                "{} chart '{}' given incompatible data",
                spec.kind.as_str(),
                spec.title
            )));
        }

        self.draw(&path, spec)
            .map_err(|e| AnalysisError::Render(format!("'{}': {e:#}", spec.title)))?;

        info!("Chart saved to {}", path.display());
        Ok(Some(path))
    }
}

fn draw_bars(root: &Area<'_>, spec: &ChartSpec, bars: &[(String, f64)]) -> anyhow::Result<()> {
    let n = bars.len().max(1);
    let y_max = upper_bound(bars.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(140)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)?;

    let label_of = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            bars.get(*i).map(|(label, _)| label.clone()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_of)
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
            BLUE.filled(),
        )
    }))?;

    Ok(())
}

fn draw_histogram(
    root: &Area<'_>,
    spec: &ChartSpec,
    bins: &[HistogramBin],
    marker: Option<f64>,
) -> anyhow::Result<()> {
    let x_range = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => first.lower..last.upper,
        _ => 0.0..1.0,
    };
    let y_max = upper_bound(bins.iter().map(|b| b.count as f64));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..y_max)?;
    chart
        .configure_mesh()
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], BLUE.mix(0.6).filled())
    }))?;

    if let Some(mark) = marker {
        chart
            .draw_series(LineSeries::new(vec![(mark, 0.0), (mark, y_max)], RED.stroke_width(2)))?
            .label(format!("mean = {mark:.2}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    Ok(())
}

/// Scatter plot with the x distribution above it and the y distribution to
/// its right.
fn draw_joint_scatter(root: &Area<'_>, spec: &ChartSpec, points: &[(f64, f64)]) -> anyhow::Result<()> {
    let root = root.titled(&spec.title, ("sans-serif", 30))?;
    let (width, height) = root.dim_in_pixel();
    let (top, bottom) = root.split_vertically(height / 5);
    let (main, right) = bottom.split_horizontally(width * 4 / 5);
    let (top_left, _) = top.split_horizontally(width * 4 / 5);

    let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let x_range = padded_range(xs.iter().copied());
    let y_range = padded_range(ys.iter().copied());

    let mut chart = ChartBuilder::on(&main)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;
    chart
        .configure_mesh()
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.4).filled())),
    )?;

    // Marginal areas reuse the main chart's margins so the axes line up.
    let x_bins = histogram_bins(&xs, MARGINAL_BINS);
    let mut top_chart = ChartBuilder::on(&top_left)
        .margin(10)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..upper_bound(x_bins.iter().map(|b| b.count as f64)))?;
    top_chart.draw_series(x_bins.iter().map(|b| {
        Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], BLUE.mix(0.5).filled())
    }))?;

    let y_bins = histogram_bins(&ys, MARGINAL_BINS);
    let mut right_chart = ChartBuilder::on(&right)
        .margin(10)
        .x_label_area_size(40)
        .build_cartesian_2d(0f64..upper_bound(y_bins.iter().map(|b| b.count as f64)), y_range)?;
    right_chart.draw_series(y_bins.iter().map(|b| {
        Rectangle::new([(0.0, b.lower), (b.count as f64, b.upper)], BLUE.mix(0.5).filled())
    }))?;

    Ok(())
}

fn draw_strip(
    root: &Area<'_>,
    spec: &ChartSpec,
    groups: &[(String, Vec<f64>)],
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let mut chart = group_chart(root, spec, groups)?;

    for (i, (_, values)) in groups.iter().enumerate() {
        let style = Palette99::pick(i).mix(0.6).filled();
        let jittered: Vec<(f64, f64)> = values
            .iter()
            .map(|v| (i as f64 + rng.gen_range(-STRIP_JITTER..STRIP_JITTER), *v))
            .collect();
        chart.draw_series(jittered.into_iter().map(|point| Circle::new(point, 3, style)))?;
    }

    Ok(())
}

fn draw_box(root: &Area<'_>, spec: &ChartSpec, groups: &[(String, Vec<f64>)]) -> anyhow::Result<()> {
    let mut chart = group_chart(root, spec, groups)?;

    for (i, (label, values)) in groups.iter().enumerate() {
        let Some(summary) = BoxSummary::from_values(values) else {
            debug!("No values for box '{}'", label);
            continue;
        };
        let x = i as f64;
        let (left, right) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);

        chart.draw_series([
            Rectangle::new(
                [(left, summary.q1), (right, summary.q3)],
                Palette99::pick(i).mix(0.5).filled(),
            ),
            Rectangle::new([(left, summary.q1), (right, summary.q3)], BLACK.stroke_width(1)),
        ])?;

        let cap = BOX_HALF_WIDTH / 2.0;
        chart.draw_series([
            PathElement::new(vec![(left, summary.median), (right, summary.median)], BLACK.stroke_width(2)),
            PathElement::new(vec![(x, summary.q3), (x, summary.upper_whisker)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x, summary.q1), (x, summary.lower_whisker)], BLACK.stroke_width(1)),
            PathElement::new(
                vec![(x - cap, summary.upper_whisker), (x + cap, summary.upper_whisker)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![(x - cap, summary.lower_whisker), (x + cap, summary.lower_whisker)],
                BLACK.stroke_width(1),
            ),
        ])?;

        chart.draw_series(
            summary
                .outliers
                .iter()
                .map(|v| Circle::new((x, *v), 2, BLACK.mix(0.5).filled())),
        )?;
    }

    Ok(())
}

/// Chart with one slot per group along x, slot `i` centred on `i`.
fn group_chart<'a, 'b>(
    root: &'a Area<'b>,
    spec: &ChartSpec,
    groups: &[(String, Vec<f64>)],
) -> anyhow::Result<ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>> {
    let n = groups.len().max(1);
    let y_range = padded_range(groups.iter().flat_map(|(_, values)| values.iter().copied()));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_range)?;

    let label_of = |x: &f64| {
        let slot = x.round();
        if (x - slot).abs() < 1e-6 && slot >= 0.0 {
            groups
                .get(slot as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_of)
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .draw()?;

    Ok(chart)
}

fn data_matches(kind: ChartKind, data: &ChartData) -> bool {
    matches!(
        (kind, data),
        (ChartKind::Bar, ChartData::Categories(_))
            | (ChartKind::Histogram, ChartData::Distribution { .. })
            | (ChartKind::JointScatter, ChartData::Points(_))
            | (ChartKind::Strip | ChartKind::Box, ChartData::Groups(_))
    )
}

/// Top of a value axis starting at zero, with headroom.
fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}
