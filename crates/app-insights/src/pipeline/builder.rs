//! Main analysis pipeline module.
//!
//! This module provides the core `AnalysisPipeline` struct and builder for
//! orchestrating load, deduplication, cleaning, aggregation, join and chart
//! rendering.

use super::chart_plan::{ChartInputs, build_chart_specs};
use crate::aggregator::{AppPredicate, Aggregator};
use crate::charts::{ChartRenderer, ChartSpec, NoopRenderer, PlottersRenderer};
use crate::cleaner::{ColumnCleaner, Deduplicator};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::joiner::ReviewJoiner;
use crate::loader::DatasetLoader;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::reporting::{
    AnalysisReport, ChartRecord, ColumnInfo, DatasetSummary, DerivedViews, SampleApp,
};
use crate::types::{CategoryCounts, ColumnStats, PricedApp, TableSchema, columns};
use crate::utils::{f64_values, string_values};
use chrono::Local;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Numeric columns summarised in the report.
const DESCRIBED_COLUMNS: [&str; 4] = [
    columns::RATING,
    columns::SIZE,
    columns::INSTALLS,
    columns::PRICE,
];

/// Cleaned tables and the report of a completed run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    /// Deduplicated and cleaned apps table
    pub apps: DataFrame,
    /// Apps joined with their complete reviews
    pub merged: DataFrame,
}

/// Aggregates and derived views computed from the cleaned apps table.
struct Aggregates {
    columns: Vec<ColumnInfo>,
    sample_apps: Vec<SampleApp>,
    category_counts: CategoryCounts,
    ratings: Vec<f64>,
    average_rating: f64,
    column_stats: Vec<ColumnStats>,
    premium_apps: Vec<PricedApp>,
    rated_and_sized: DataFrame,
    large_categories: DataFrame,
    paid_apps: DataFrame,
    popular_categories: DataFrame,
    affordable_popular: DataFrame,
    log_installs_by_type: Vec<(String, Vec<f64>)>,
}

/// The app market analysis pipeline.
///
/// Use [`AnalysisPipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use app_insights::{AnalysisConfig, AnalysisPipeline};
///
/// let outcome = AnalysisPipeline::builder()
///     .config(AnalysisConfig::builder().output_dir("charts").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("{} apps", outcome.report.dataset.total_apps);
/// ```
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(AnalysisPipeline: Send, Sync);

impl AnalysisPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the analysis, drawing charts as PNG files unless disabled in the
    /// configuration.
    pub fn run(&self) -> Result<AnalysisOutcome> {
        if self.config.render_charts {
            let mut renderer = PlottersRenderer::new(
                &self.config.output_dir,
                self.config.chart_size,
                self.config.sample_seed,
            )
            .in_stage(AnalysisStage::Rendering)?;
            self.run_with_renderer(&mut renderer)
        } else {
            self.run_with_renderer(&mut NoopRenderer)
        }
    }

    /// Run the analysis, handing every chart to `renderer`.
    ///
    /// # Errors
    ///
    /// Every error is tagged with the [`AnalysisStage`] it was raised in.
    pub fn run_with_renderer(&self, renderer: &mut dyn ChartRenderer) -> Result<AnalysisOutcome> {
        match self.run_internal(renderer) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(outcome)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn start_stage(&self, stage: AnalysisStage, message: &str) {
        info!("{}...", stage.display_name());
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn finish_stage(&self, stage: AnalysisStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn run_internal(&self, renderer: &mut dyn ChartRenderer) -> Result<AnalysisOutcome> {
        let start_time = Instant::now();

        // Step 1: Load both tables
        self.start_stage(AnalysisStage::Loading, "Loading apps and reviews...");
        let raw_apps = DatasetLoader::load(&self.config.apps_path, &TableSchema::apps())
            .in_stage(AnalysisStage::Loading)?;
        let reviews = DatasetLoader::load(&self.config.reviews_path, &TableSchema::reviews())
            .in_stage(AnalysisStage::Loading)?;
        self.finish_stage(
            AnalysisStage::Loading,
            format!("Loaded {} apps and {} reviews", raw_apps.height(), reviews.height()),
        );

        // Step 2: Remove duplicate app rows
        self.start_stage(AnalysisStage::Deduplicating, "Removing duplicate apps...");
        let dedup = Deduplicator::remove_duplicates(&raw_apps).in_stage(AnalysisStage::Deduplicating)?;
        info!("Total number of apps in the dataset = {}", dedup.data.height());
        self.finish_stage(
            AnalysisStage::Deduplicating,
            format!("Removed {} duplicate rows", dedup.duplicates_removed),
        );

        // Step 3: Strip formatting characters and coerce
        self.start_stage(AnalysisStage::Cleaning, "Cleaning numeric text columns...");
        let cleaner = ColumnCleaner::from_config(&self.config);
        let apps = cleaner.clean(&dedup.data).in_stage(AnalysisStage::Cleaning)?;
        self.finish_stage(
            AnalysisStage::Cleaning,
            format!("Cleaned columns {:?}", cleaner.columns()),
        );

        // Step 4: Aggregates and derived views
        self.start_stage(AnalysisStage::Aggregating, "Computing aggregates...");
        let aggregates = self.aggregate(&apps).in_stage(AnalysisStage::Aggregating)?;
        self.finish_stage(
            AnalysisStage::Aggregating,
            format!(
                "{} categories, average rating {:.3}",
                aggregates.category_counts.distinct(),
                aggregates.average_rating
            ),
        );

        // Step 5: Join reviews onto apps
        self.start_stage(AnalysisStage::Joining, "Joining reviews onto apps...");
        let join = ReviewJoiner::join(&apps, &reviews).in_stage(AnalysisStage::Joining)?;
        self.finish_stage(
            AnalysisStage::Joining,
            format!("{} merged rows", join.frame.height()),
        );

        // Step 6: Charts
        self.start_stage(AnalysisStage::Rendering, "Rendering charts...");
        let specs = build_chart_specs(
            &self.config,
            &ChartInputs {
                category_counts: &aggregates.category_counts,
                ratings: &aggregates.ratings,
                average_rating: aggregates.average_rating,
                large_categories: &aggregates.large_categories,
                paid_apps: &aggregates.paid_apps,
                popular_categories: &aggregates.popular_categories,
                affordable_popular: &aggregates.affordable_popular,
                log_installs_by_type: &aggregates.log_installs_by_type,
                merged: &join.frame,
            },
        )
        .in_stage(AnalysisStage::Rendering)?;
        let charts = self
            .render_charts(renderer, &specs)
            .in_stage(AnalysisStage::Rendering)?;

        // Step 7: Report
        self.start_stage(AnalysisStage::Reporting, "Assembling report...");
        let views = DerivedViews {
            rated_and_sized: aggregates.rated_and_sized.height(),
            large_categories: aggregates.large_categories.height(),
            paid_apps: aggregates.paid_apps.height(),
            popular_categories: aggregates.popular_categories.height(),
            affordable_popular: aggregates.affordable_popular.height(),
            premium_apps: aggregates.premium_apps.len(),
        };
        debug!("Derived views: {:?}", views);

        let report = AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            apps_file: self.config.apps_path.display().to_string(),
            reviews_file: self.config.reviews_path.display().to_string(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            dataset: DatasetSummary {
                apps_loaded: raw_apps.height(),
                duplicates_removed: dedup.duplicates_removed,
                total_apps: apps.height(),
                reviews_loaded: reviews.height(),
            },
            columns: aggregates.columns,
            sample_apps: aggregates.sample_apps,
            category_counts: aggregates.category_counts,
            average_rating: aggregates.average_rating,
            column_stats: aggregates.column_stats,
            premium_price_threshold: self.config.premium_price_threshold,
            premium_apps: aggregates.premium_apps,
            views,
            join: join.summary(),
            charts,
        };
        self.finish_stage(AnalysisStage::Reporting, "Report ready");

        info!("Analysis finished in {}ms", report.duration_ms);
        Ok(AnalysisOutcome {
            report,
            apps,
            merged: join.frame,
        })
    }

    fn aggregate(&self, apps: &DataFrame) -> Result<Aggregates> {
        let aggregator = Aggregator::new(apps);

        let columns = aggregator
            .column_types()
            .into_iter()
            .map(|(name, dtype)| {
                let nulls = apps.column(&name).map(|c| c.null_count()).unwrap_or(0);
                ColumnInfo {
                    non_null: apps.height() - nulls,
                    name,
                    dtype,
                }
            })
            .collect();

        let sample = aggregator.sample_rows(self.config.sample_size, self.config.sample_seed)?;
        let sample_apps = sample_apps(&sample)?;

        let category_counts = aggregator.category_counts()?;
        info!("Number of categories = {}", category_counts.distinct());

        let average_rating = aggregator.average_rating()?;
        info!("Average app rating = {:.4}", average_rating);
        let ratings: Vec<f64> = f64_values(apps, columns::RATING)?
            .into_iter()
            .flatten()
            .collect();

        let mut column_stats = Vec::with_capacity(DESCRIBED_COLUMNS.len());
        for name in DESCRIBED_COLUMNS {
            match aggregator.describe_column(name) {
                Ok(stats) => column_stats.push(stats),
                Err(AnalysisError::EmptyInput(what)) => warn!("Skipping {}: no values", what),
                Err(e) => return Err(e),
            }
        }

        let rated_and_sized = aggregator.rated_and_sized()?;
        let large_categories = aggregator.large_categories(self.config.large_category_min_size)?;
        let paid_apps = Aggregator::filter_by_predicate(
            &rated_and_sized,
            &AppPredicate::TypeIs("Paid".to_string()),
        )?;
        let popular_categories = Aggregator::filter_by_predicate(
            apps,
            &AppPredicate::CategoryIn(self.config.popular_categories.clone()),
        )?;
        let affordable_popular = Aggregator::filter_by_predicate(
            &popular_categories,
            &AppPredicate::PriceBelow(self.config.affordable_price_ceiling),
        )?;
        let premium_apps = aggregator.priced_above(self.config.premium_price_threshold)?;
        let log_installs_by_type = aggregator.log_installs_by_type()?;

        Ok(Aggregates {
            columns,
            sample_apps,
            category_counts,
            ratings,
            average_rating,
            column_stats,
            premium_apps,
            rated_and_sized,
            large_categories,
            paid_apps,
            popular_categories,
            affordable_popular,
            log_installs_by_type,
        })
    }

    fn render_charts(
        &self,
        renderer: &mut dyn ChartRenderer,
        specs: &[ChartSpec],
    ) -> Result<Vec<ChartRecord>> {
        let total = specs.len();
        let mut records = Vec::with_capacity(total);

        for (i, spec) in specs.iter().enumerate() {
            if spec.data.is_empty() {
                warn!("Chart '{}' has no data", spec.title);
            }
            let file = renderer.render(spec)?;
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Rendering,
                i + 1,
                total,
                format!("Rendered '{}'", spec.title),
            ));
            records.push(ChartRecord {
                kind: spec.kind,
                title: spec.title.clone(),
                file: file.map(|path| path.display().to_string()),
            });
        }

        Ok(records)
    }
}

fn sample_apps(sample: &DataFrame) -> Result<Vec<SampleApp>> {
    let apps = string_values(sample, columns::APP)?;
    let categories = string_values(sample, columns::CATEGORY)?;
    let types = string_values(sample, columns::TYPE)?;
    let ratings = f64_values(sample, columns::RATING)?;
    let installs = f64_values(sample, columns::INSTALLS)?;
    let prices = f64_values(sample, columns::PRICE)?;

    Ok((0..sample.height())
        .map(|i| SampleApp {
            app: apps[i].clone().unwrap_or_default(),
            category: categories[i].clone(),
            rating: ratings[i],
            installs: installs[i].unwrap_or_default(),
            app_type: types[i].clone(),
            price: prices[i].unwrap_or_default(),
        })
        .collect())
}

/// Builder for creating an [`AnalysisPipeline`] instance.
///
/// Use [`AnalysisPipeline::builder()`] to get started.
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(AnalysisPipelineBuilder: Send);

impl AnalysisPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns [`AnalysisError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> Result<AnalysisPipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

        Ok(AnalysisPipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = AnalysisPipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert_eq!(pipeline.config().large_category_min_size, 250);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.rating_histogram_bins = 0;

        let result = AnalysisPipeline::builder().config(config).build();
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = AnalysisPipeline::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.report_progress(ProgressUpdate::new(AnalysisStage::Loading, 0.5, "Test"));

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_input_fails_in_loading_stage() {
        let config = AnalysisConfig::builder()
            .apps_path("no/such/apps.csv")
            .render_charts(false)
            .build()
            .unwrap();
        let pipeline = AnalysisPipeline::builder().config(config).build().unwrap();

        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage(), Some(AnalysisStage::Loading));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_sample_apps_from_frame() {
        let df = df! {
            "App" => ["A"],
            "Category" => ["GAME"],
            "Rating" => [None::<f64>],
            "Installs" => [100.0],
            "Type" => ["Free"],
            "Price" => [0.0],
        }
        .unwrap();

        let sample = sample_apps(&df).unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].app, "A");
        assert_eq!(sample[0].rating, None);
        assert_eq!(sample[0].installs, 100.0);
    }
}
