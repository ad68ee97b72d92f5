//! The fixed sequence of charts drawn by an analysis run.

use crate::aggregator::{grouped_values, series_pairs};
use crate::charts::{ChartData, ChartKind, ChartSpec};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{CategoryCounts, columns};
use polars::prelude::DataFrame;

/// Derived views and aggregates the charts are drawn from.
pub(crate) struct ChartInputs<'a> {
    pub category_counts: &'a CategoryCounts,
    pub ratings: &'a [f64],
    pub average_rating: f64,
    pub large_categories: &'a DataFrame,
    pub paid_apps: &'a DataFrame,
    pub popular_categories: &'a DataFrame,
    pub affordable_popular: &'a DataFrame,
    pub log_installs_by_type: &'a [(String, Vec<f64>)],
    pub merged: &'a DataFrame,
}

/// Build the eight chart specs in drawing order.
pub(crate) fn build_chart_specs(
    config: &AnalysisConfig,
    inputs: &ChartInputs<'_>,
) -> Result<Vec<ChartSpec>> {
    let bars = inputs
        .category_counts
        .counts
        .iter()
        .map(|(category, count)| (category.clone(), *count as f64))
        .collect();

    Ok(vec![
        spec(
            ChartKind::Bar,
            "Number of Apps in Each Category",
            ("Category", "Number of Apps"),
            ChartData::Categories(bars),
            "01_apps_per_category",
        ),
        spec(
            ChartKind::Histogram,
            "Distribution of App Ratings",
            ("Rating", "Number of Apps"),
            ChartData::Distribution {
                values: inputs.ratings.to_vec(),
                bins: config.rating_histogram_bins,
                marker: Some(inputs.average_rating),
            },
            "02_rating_distribution",
        ),
        spec(
            ChartKind::JointScatter,
            "Size vs. Rating for Large Categories",
            ("Size", "Rating"),
            ChartData::Points(series_pairs(
                inputs.large_categories,
                columns::SIZE,
                columns::RATING,
            )?),
            "03_size_vs_rating_large_categories",
        ),
        spec(
            ChartKind::JointScatter,
            "Price vs. Rating for Paid Apps",
            ("Price", "Rating"),
            ChartData::Points(series_pairs(
                inputs.paid_apps,
                columns::PRICE,
                columns::RATING,
            )?),
            "04_price_vs_rating_paid_apps",
        ),
        spec(
            ChartKind::Strip,
            "App Pricing Trend Across Categories",
            ("Category", "Price"),
            ChartData::Groups(grouped_values(
                inputs.popular_categories,
                columns::CATEGORY,
                columns::PRICE,
            )?),
            "05_price_by_category",
        ),
        spec(
            ChartKind::Strip,
            &format!(
                "App Pricing Trend Across Categories After Filtering for Apps Priced Below ${}",
                config.affordable_price_ceiling
            ),
            ("Category", "Price"),
            ChartData::Groups(grouped_values(
                inputs.affordable_popular,
                columns::CATEGORY,
                columns::PRICE,
            )?),
            "06_price_by_category_affordable",
        ),
        spec(
            ChartKind::Box,
            "Number of Installs of Paid Apps vs. Free Apps",
            ("Type", "Log of Number of Installs"),
            ChartData::Groups(inputs.log_installs_by_type.to_vec()),
            "07_installs_by_type",
        ),
        spec(
            ChartKind::Box,
            "Sentiment Polarity Distribution",
            ("Type", "Sentiment Polarity"),
            ChartData::Groups(grouped_values(
                inputs.merged,
                columns::TYPE,
                columns::SENTIMENT_POLARITY,
            )?),
            "08_sentiment_polarity_by_type",
        ),
    ])
}

fn spec(
    kind: ChartKind,
    title: &str,
    (x_label, y_label): (&str, &str),
    data: ChartData,
    file_stem: &str,
) -> ChartSpec {
    ChartSpec {
        kind,
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        data,
        file_stem: file_stem.to_string(),
    }
}
