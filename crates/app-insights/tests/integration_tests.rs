//! Integration tests for the analysis pipeline.
//!
//! These tests run the whole pipeline over small fixture tables and check the
//! report, the derived tables and the charts handed to the renderer.

use app_insights::charts::{ChartData, ChartKind, ChartRenderer, ChartSpec};
use app_insights::{
    AnalysisConfig, AnalysisError, AnalysisOutcome, AnalysisPipeline, AnalysisStage,
    PricedApp, ProgressUpdate, ReportGenerator,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config_for(apps: &str) -> app_insights::AnalysisConfigBuilder {
    AnalysisConfig::builder()
        .apps_path(fixtures_path().join(apps))
        .reviews_path(fixtures_path().join("user_reviews.csv"))
        .render_charts(false)
        .sample_seed(42)
}

/// Renderer that keeps every spec it is given.
#[derive(Default)]
struct RecordingRenderer {
    specs: Vec<ChartSpec>,
}

impl ChartRenderer for RecordingRenderer {
    fn render(&mut self, spec: &ChartSpec) -> app_insights::Result<Option<PathBuf>> {
        self.specs.push(spec.clone());
        Ok(Some(PathBuf::from(format!("{}.png", spec.file_stem))))
    }
}

fn run_recorded(config: AnalysisConfig) -> (AnalysisOutcome, Vec<ChartSpec>) {
    let pipeline = AnalysisPipeline::builder().config(config).build().unwrap();
    let mut renderer = RecordingRenderer::default();
    let outcome = pipeline.run_with_renderer(&mut renderer).unwrap();
    (outcome, renderer.specs)
}

fn run_fixture() -> (AnalysisOutcome, Vec<ChartSpec>) {
    run_recorded(config_for("apps.csv").build().unwrap())
}

fn groups(spec: &ChartSpec) -> &[(String, Vec<f64>)] {
    match &spec.data {
        ChartData::Groups(groups) => groups,
        other => panic!("expected grouped data, got {other:?}"),
    }
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[test]
fn test_pipeline_renders_eight_charts_in_order() {
    let (outcome, specs) = run_fixture();

    let stems: Vec<&str> = specs.iter().map(|s| s.file_stem.as_str()).collect();
    assert_eq!(
        stems,
        vec![
            "01_apps_per_category",
            "02_rating_distribution",
            "03_size_vs_rating_large_categories",
            "04_price_vs_rating_paid_apps",
            "05_price_by_category",
            "06_price_by_category_affordable",
            "07_installs_by_type",
            "08_sentiment_polarity_by_type",
        ]
    );

    let kinds: Vec<ChartKind> = specs.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChartKind::Bar,
            ChartKind::Histogram,
            ChartKind::JointScatter,
            ChartKind::JointScatter,
            ChartKind::Strip,
            ChartKind::Strip,
            ChartKind::Box,
            ChartKind::Box,
        ]
    );
    assert_eq!(
        specs[5].title,
        "App Pricing Trend Across Categories After Filtering for Apps Priced Below $100"
    );

    assert_eq!(outcome.report.charts.len(), 8);
    assert_eq!(
        outcome.report.charts[0].file.as_deref(),
        Some("01_apps_per_category.png")
    );
}

#[test]
fn test_pipeline_dataset_summary() {
    let (outcome, _) = run_fixture();
    let dataset = outcome.report.dataset;

    assert_eq!(dataset.apps_loaded, 11);
    assert_eq!(dataset.duplicates_removed, 2);
    assert_eq!(dataset.total_apps, 9);
    assert_eq!(dataset.reviews_loaded, 7);
    assert_eq!(outcome.apps.height(), 9);
}

#[test]
fn test_pipeline_cleans_installs_and_price() {
    let (outcome, _) = run_fixture();

    let installs: Vec<f64> = outcome
        .apps
        .column("Installs")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(
        installs,
        vec![
            10_000.0, 500_000.0, 5_000_000.0, 1_000_000.0, 100_000.0, 1_000.0, 10_000.0,
            5_000.0, 50_000.0,
        ]
    );

    let prices: Vec<f64> = outcome
        .apps
        .column("Price")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(prices, vec![0.0, 0.0, 4.99, 0.0, 2.99, 0.0, 399.99, 149.99, 0.0]);
}

#[test]
fn test_pipeline_category_counts_and_average_rating() {
    let (outcome, specs) = run_fixture();
    let report = &outcome.report;

    assert_eq!(report.category_counts.distinct(), 5);
    assert_eq!(
        report.category_counts.counts,
        vec![
            ("ART_AND_DESIGN".to_string(), 3),
            ("GAME".to_string(), 2),
            ("FINANCE".to_string(), 2),
            ("MEDICAL".to_string(), 1),
            ("WEATHER".to_string(), 1),
        ]
    );
    assert!((report.average_rating - 4.2125).abs() < 1e-9);

    match &specs[1].data {
        ChartData::Distribution {
            values,
            bins,
            marker,
        } => {
            assert_eq!(values.len(), 8);
            assert_eq!(*bins, 30);
            assert!((marker.unwrap() - 4.2125).abs() < 1e-9);
        }
        other => panic!("expected a distribution, got {other:?}"),
    }
}

#[test]
fn test_pipeline_derived_views() {
    let config = config_for("apps.csv")
        .large_category_min_size(2)
        .build()
        .unwrap();
    let (outcome, specs) = run_recorded(config);
    let views = outcome.report.views;

    assert_eq!(views.rated_and_sized, 6);
    assert_eq!(views.large_categories, 3);
    assert_eq!(views.paid_apps, 4);
    assert_eq!(views.popular_categories, 5);
    assert_eq!(views.affordable_popular, 3);
    assert_eq!(views.premium_apps, 1);

    assert_eq!(
        outcome.report.premium_apps,
        vec![PricedApp {
            category: "FINANCE".to_string(),
            app: "I am Rich".to_string(),
            price: 399.99,
        }]
    );

    // Only ART_AND_DESIGN has two or more rated and sized apps.
    assert_eq!(
        specs[2].data,
        ChartData::Points(vec![(19.0, 4.1), (14.0, 3.9), (25.0, 4.5)])
    );
    assert_eq!(
        groups(&specs[5]),
        &[
            ("GAME".to_string(), vec![0.0, 2.99]),
            ("FINANCE".to_string(), vec![0.0]),
        ]
    );
}

#[test]
fn test_default_minimum_leaves_no_large_categories() {
    let (outcome, specs) = run_fixture();

    assert_eq!(outcome.report.views.large_categories, 0);
    assert!(specs[2].data.is_empty());
}

#[test]
fn test_installs_box_is_log_scaled_by_type() {
    let (_, specs) = run_fixture();
    let installs = groups(&specs[6]);

    assert_eq!(installs.len(), 2);
    assert_eq!(installs[0].0, "Free");
    assert_eq!(installs[1].0, "Paid");
    assert_eq!(installs[0].1.len(), 5);
    assert_eq!(installs[1].1.len(), 4);
    assert!((installs[0].1[0] - 10_001.0_f64.ln()).abs() < 1e-9);
}

#[test]
fn test_pipeline_merges_reviews() {
    let (outcome, specs) = run_fixture();
    let join = outcome.report.join;

    assert_eq!(join.matched, 6);
    assert_eq!(join.dropped, 1);
    assert_eq!(join.rows, 5);

    let apps: Vec<&str> = outcome
        .merged
        .column("App")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(
        apps,
        vec!["Photo Editor", "Photo Editor", "Dragon Run", "Dragon Run", "Dose Tracker"]
    );

    assert_eq!(
        groups(&specs[7]),
        &[
            ("Free".to_string(), vec![0.8, 0.0]),
            ("Paid".to_string(), vec![-0.4, 0.35, 0.5]),
        ]
    );
}

#[test]
fn test_pipeline_without_charts_records_no_files() {
    let pipeline = AnalysisPipeline::builder()
        .config(config_for("apps.csv").build().unwrap())
        .build()
        .unwrap();

    let outcome = pipeline.run().unwrap();
    assert_eq!(outcome.report.charts.len(), 8);
    assert!(outcome.report.charts.iter().all(|c| c.file.is_none()));
}

#[test]
fn test_seeded_sample_is_repeatable() {
    let config = config_for("apps.csv").sample_size(3).build().unwrap();

    let (first, _) = run_recorded(config.clone());
    let (second, _) = run_recorded(config);

    assert_eq!(first.report.sample_apps.len(), 3);
    assert_eq!(first.report.sample_apps, second.report.sample_apps);
}

// ============================================================================
// Error Tests
// ============================================================================

fn run_error(config: AnalysisConfig) -> AnalysisError {
    let pipeline = AnalysisPipeline::builder().config(config).build().unwrap();
    pipeline
        .run_with_renderer(&mut RecordingRenderer::default())
        .unwrap_err()
}

#[test]
fn test_missing_apps_file_fails_loading() {
    let err = run_error(config_for("does_not_exist.csv").build().unwrap());

    assert_eq!(err.stage(), Some(AnalysisStage::Loading));
    assert!(err.is_load_error());
    assert!(matches!(err.root(), AnalysisError::Load { .. }));
}

#[test]
fn test_header_only_apps_file_fails_loading() {
    let err = run_error(config_for("apps_header_only.csv").build().unwrap());

    assert_eq!(err.stage(), Some(AnalysisStage::Loading));
    assert!(err.is_load_error());
}

#[test]
fn test_apps_without_price_fail_loading() {
    let err = run_error(config_for("apps_missing_price.csv").build().unwrap());

    assert_eq!(err.stage(), Some(AnalysisStage::Loading));
    match err.root() {
        AnalysisError::MissingColumns { columns, .. } => {
            assert_eq!(columns, &vec!["Price".to_string()]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn test_unparsable_price_fails_cleaning() {
    let err = run_error(config_for("apps_bad_price.csv").build().unwrap());

    assert_eq!(err.stage(), Some(AnalysisStage::Cleaning));
    assert_eq!(err.error_code(), "PARSE_ERROR");
    match err.root() {
        AnalysisError::Parse { row, column, value } => {
            assert_eq!(*row, 1);
            assert_eq!(column, "Price");
            assert_eq!(value, "Everyone");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

// ============================================================================
// Progress and Report Tests
// ============================================================================

#[test]
fn test_progress_updates_follow_stage_order() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    let pipeline = AnalysisPipeline::builder()
        .config(config_for("apps.csv").build().unwrap())
        .on_progress(move |update| {
            updates_clone.lock().unwrap().push(update);
        })
        .build()
        .unwrap();
    pipeline
        .run_with_renderer(&mut RecordingRenderer::default())
        .unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().unwrap().stage, AnalysisStage::Loading);
    assert_eq!(updates.last().unwrap().stage, AnalysisStage::Complete);

    let progress: Vec<f32> = updates.iter().map(|u| u.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1] + 1e-6));

    let chart_steps: Vec<&str> = updates
        .iter()
        .filter_map(|u| u.sub_stage.as_deref())
        .collect();
    assert_eq!(chart_steps.len(), 8);
    assert_eq!(chart_steps.last(), Some(&"8/8"));
}

#[test]
fn test_failed_run_reports_failed_stage() {
    let stages: Arc<Mutex<Vec<AnalysisStage>>> = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let pipeline = AnalysisPipeline::builder()
        .config(config_for("apps_bad_price.csv").build().unwrap())
        .on_progress(move |update| {
            stages_clone.lock().unwrap().push(update.stage);
        })
        .build()
        .unwrap();
    assert!(pipeline.run().is_err());

    let stages = stages.lock().unwrap();
    assert_eq!(stages.last(), Some(&AnalysisStage::Failed));
    assert!(!stages.contains(&AnalysisStage::Aggregating));
}

#[test]
fn test_report_written_as_json() {
    let (outcome, _) = run_fixture();
    let dir = tempfile::TempDir::new().unwrap();

    let generator = ReportGenerator::new(dir.path());
    let path = generator.write_report_to_file(&outcome.report).unwrap();
    assert_eq!(path, dir.path().join("analysis_report.json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["dataset"]["total_apps"], 9);
    assert_eq!(json["join"]["rows"], 5);
    assert_eq!(json["charts"][0]["kind"], "bar");
    assert_eq!(json["premium_apps"][0]["app"], "I am Rich");
    assert_eq!(json["category_counts"]["counts"][0][0], "ART_AND_DESIGN");
}
