//! Configuration types for the analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Columns whose formatting characters are stripped before numeric coercion.
pub const DEFAULT_COLUMNS_TO_CLEAN: [&str; 2] = ["Installs", "Price"];

/// Characters removed from the cleaned columns (`"10,000+"`, `"$4.99"`).
pub const DEFAULT_CHARS_TO_STRIP: [char; 3] = ['+', ',', '$'];

/// Minimum group size for a category to count as "large".
pub const DEFAULT_LARGE_CATEGORY_MIN_SIZE: usize = 250;

/// Categories compared in the pricing strip charts.
pub const DEFAULT_POPULAR_CATEGORIES: [&str; 8] = [
    "GAME",
    "FAMILY",
    "PHOTOGRAPHY",
    "MEDICAL",
    "TOOLS",
    "FINANCE",
    "LIFESTYLE",
    "BUSINESS",
];

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use app_insights::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .apps_path("datasets/apps.csv")
///     .large_category_min_size(100)
///     .render_charts(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Path to the apps table.
    /// Default: "datasets/apps.csv"
    pub apps_path: PathBuf,

    /// Path to the user reviews table.
    /// Default: "datasets/user_reviews.csv"
    pub reviews_path: PathBuf,

    /// Directory that receives chart images and the JSON report.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Columns stripped of formatting characters and coerced to numbers.
    /// Default: ["Installs", "Price"]
    pub columns_to_clean: Vec<String>,

    /// Characters removed from every value of `columns_to_clean`.
    /// Default: ['+', ',', '$']
    pub chars_to_strip: Vec<char>,

    /// Minimum number of rated and sized apps for a category to be kept
    /// in the size-vs-rating view.
    /// Default: 250
    pub large_category_min_size: usize,

    /// Categories compared in the pricing views.
    pub popular_categories: Vec<String>,

    /// Apps priced above this are listed individually.
    /// Default: 200.0
    pub premium_price_threshold: f64,

    /// Upper price bound for the filtered pricing view.
    /// Default: 100.0
    pub affordable_price_ceiling: f64,

    /// Number of bins in the rating histogram.
    /// Default: 30
    pub rating_histogram_bins: usize,

    /// Number of randomly sampled apps printed after loading.
    /// Default: 5
    pub sample_size: usize,

    /// Seed for the row sample. `None` samples from entropy.
    /// Default: None
    pub sample_seed: Option<u64>,

    /// Whether charts are drawn at all.
    /// Default: true
    pub render_charts: bool,

    /// Chart image size in pixels (width, height).
    /// Default: (1200, 600)
    pub chart_size: (u32, u32),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            apps_path: PathBuf::from("datasets/apps.csv"),
            reviews_path: PathBuf::from("datasets/user_reviews.csv"),
            output_dir: PathBuf::from("outputs"),
            columns_to_clean: DEFAULT_COLUMNS_TO_CLEAN.iter().map(|s| s.to_string()).collect(),
            chars_to_strip: DEFAULT_CHARS_TO_STRIP.to_vec(),
            large_category_min_size: DEFAULT_LARGE_CATEGORY_MIN_SIZE,
            popular_categories: DEFAULT_POPULAR_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            premium_price_threshold: 200.0,
            affordable_price_ceiling: 100.0,
            rating_histogram_bins: 30,
            sample_size: 5,
            sample_seed: None,
            render_charts: true,
            chart_size: (1200, 600),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.columns_to_clean.is_empty() {
            return Err(ConfigValidationError::NoColumnsToClean);
        }

        if self.large_category_min_size == 0 {
            return Err(ConfigValidationError::InvalidMinimum {
                field: "large_category_min_size".to_string(),
            });
        }

        if self.rating_histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidMinimum {
                field: "rating_histogram_bins".to_string(),
            });
        }

        for (field, value) in [
            ("premium_price_threshold", self.premium_price_threshold),
            ("affordable_price_ceiling", self.affordable_price_ceiling),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::InvalidPrice {
                    field: field.to_string(),
                    value,
                });
            }
        }

        let (width, height) = self.chart_size;
        if width == 0 || height == 0 {
            return Err(ConfigValidationError::InvalidChartSize(width, height));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one column must be configured for cleaning")]
    NoColumnsToClean,

    #[error("Invalid value for '{field}': must be at least 1")]
    InvalidMinimum { field: String },

    #[error("Invalid price for '{field}': {value} (must be a positive number)")]
    InvalidPrice { field: String, value: f64 },

    #[error("Invalid chart size: {0}x{1}")]
    InvalidChartSize(u32, u32),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    apps_path: Option<PathBuf>,
    reviews_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    columns_to_clean: Option<Vec<String>>,
    chars_to_strip: Option<Vec<char>>,
    large_category_min_size: Option<usize>,
    popular_categories: Option<Vec<String>>,
    premium_price_threshold: Option<f64>,
    affordable_price_ceiling: Option<f64>,
    rating_histogram_bins: Option<usize>,
    sample_size: Option<usize>,
    sample_seed: Option<u64>,
    render_charts: Option<bool>,
    chart_size: Option<(u32, u32)>,
}

impl AnalysisConfigBuilder {
    /// Set the apps table path.
    pub fn apps_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.apps_path = Some(path.into());
        self
    }

    /// Set the reviews table path.
    pub fn reviews_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reviews_path = Some(path.into());
        self
    }

    /// Set the output directory for charts and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Replace the list of columns to clean.
    pub fn columns_to_clean<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns_to_clean = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the set of characters stripped before coercion.
    pub fn chars_to_strip(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.chars_to_strip = Some(chars.into_iter().collect());
        self
    }

    /// Set the minimum size of a large category.
    pub fn large_category_min_size(mut self, size: usize) -> Self {
        self.large_category_min_size = Some(size);
        self
    }

    /// Replace the popular category set.
    pub fn popular_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.popular_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Set the price above which apps are listed individually.
    pub fn premium_price_threshold(mut self, price: f64) -> Self {
        self.premium_price_threshold = Some(price);
        self
    }

    /// Set the price ceiling of the filtered pricing view.
    pub fn affordable_price_ceiling(mut self, price: f64) -> Self {
        self.affordable_price_ceiling = Some(price);
        self
    }

    /// Set the number of rating histogram bins.
    pub fn rating_histogram_bins(mut self, bins: usize) -> Self {
        self.rating_histogram_bins = Some(bins);
        self
    }

    /// Set how many sample rows are printed.
    pub fn sample_size(mut self, size: usize) -> Self {
        self.sample_size = Some(size);
        self
    }

    /// Fix the sampling seed for reproducible output.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// Enable or disable chart rendering.
    pub fn render_charts(mut self, render: bool) -> Self {
        self.render_charts = Some(render);
        self
    }

    /// Set the chart image size in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = Some((width, height));
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            apps_path: self.apps_path.unwrap_or(defaults.apps_path),
            reviews_path: self.reviews_path.unwrap_or(defaults.reviews_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            columns_to_clean: self.columns_to_clean.unwrap_or(defaults.columns_to_clean),
            chars_to_strip: self.chars_to_strip.unwrap_or(defaults.chars_to_strip),
            large_category_min_size: self
                .large_category_min_size
                .unwrap_or(defaults.large_category_min_size),
            popular_categories: self
                .popular_categories
                .unwrap_or(defaults.popular_categories),
            premium_price_threshold: self
                .premium_price_threshold
                .unwrap_or(defaults.premium_price_threshold),
            affordable_price_ceiling: self
                .affordable_price_ceiling
                .unwrap_or(defaults.affordable_price_ceiling),
            rating_histogram_bins: self
                .rating_histogram_bins
                .unwrap_or(defaults.rating_histogram_bins),
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            sample_seed: self.sample_seed,
            render_charts: self.render_charts.unwrap_or(defaults.render_charts),
            chart_size: self.chart_size.unwrap_or(defaults.chart_size),
        };

        config.validate()?;
        Ok(config)
    }
}
