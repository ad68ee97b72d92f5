//! CLI entry point for the app store analysis.

use anyhow::{Result, anyhow};
use app_insights::{AnalysisConfig, AnalysisPipeline, AnalysisReport, ReportGenerator};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory analysis of app store apps and user reviews",
    long_about = "Loads an apps table and a user reviews table, cleans the numeric text \
                  columns, prints descriptive statistics and draws eight charts.\n\n\
                  EXAMPLES:\n  \
                  # Run with the default dataset paths\n  \
                  app-insights\n\n  \
                  # Custom inputs and output directory\n  \
                  app-insights --apps data/apps.csv --reviews data/user_reviews.csv -o charts/\n\n  \
                  # Statistics only, as JSON\n  \
                  app-insights --no-charts --json"
)]
struct Args {
    /// Path to the apps CSV file
    #[arg(long, default_value = "datasets/apps.csv")]
    apps: String,

    /// Path to the user reviews CSV file
    #[arg(long, default_value = "datasets/user_reviews.csv")]
    reviews: String,

    /// Output directory for charts and the report
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    /// Useful for piping to other tools: `... --json | jq .average_rating`
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <output>/analysis_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Skip drawing charts
    #[arg(long)]
    no_charts: bool,

    /// Minimum number of rated and sized apps for a category to count as large
    #[arg(long)]
    min_category_size: Option<usize>,

    /// Seed for the random sample of apps
    #[arg(long)]
    seed: Option<u64>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let mut config_builder = AnalysisConfig::builder()
        .apps_path(&args.apps)
        .reviews_path(&args.reviews)
        .output_dir(&args.output)
        .render_charts(!args.no_charts);

    if let Some(size) = args.min_category_size {
        config_builder = config_builder.large_category_min_size(size);
    }

    if let Some(seed) = args.seed {
        config_builder = config_builder.sample_seed(seed);
    }

    let config = config_builder.build()?;

    let mut builder = AnalysisPipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let pipeline = builder.build()?;

    info!("{}", "=".repeat(80));
    info!("Starting app store analysis...");
    info!("{}", "=".repeat(80));

    let outcome = match pipeline.run() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Analysis failed: {}", e);
            return Err(anyhow!("Analysis failed: {}", e));
        }
    };

    handle_output(&outcome.report, &args)
}

/// Handle the report based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file (combines with either of the above)
fn handle_output(report: &AnalysisReport, args: &Args) -> Result<()> {
    if args.emit_report {
        let generator = ReportGenerator::new(&args.output);
        let report_path = generator.write_report_to_file(report)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", ReportGenerator::to_json(report)?);
    } else {
        print_human_readable_summary(report);
    }

    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Print a human-readable summary of the analysis.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &AnalysisReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Apps:    {}", report.apps_file);
    println!("Reviews: {}", report.reviews_file);
    println!();

    let dataset = &report.dataset;
    println!(
        "Total number of apps in the dataset = {}",
        dataset.total_apps
    );
    println!(
        "  ({} loaded, {} duplicates removed, {} reviews loaded)",
        dataset.apps_loaded, dataset.duplicates_removed, dataset.reviews_loaded
    );
    println!();

    println!("SAMPLE APPS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<30} {:<20} {:<8} {:<14} {:<6} {:<8}",
        "App", "Category", "Rating", "Installs", "Type", "Price"
    );
    for app in &report.sample_apps {
        let rating = app
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<30} {:<20} {:<8} {:<14} {:<6} {:<8.2}",
            truncate_str(&app.app, 29),
            truncate_str(app.category.as_deref().unwrap_or("-"), 19),
            rating,
            app.installs,
            app.app_type.as_deref().unwrap_or("-"),
            app.price
        );
    }
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!("{:<28} {:<10} {:<10}", "Column", "Type", "Non-null");
    for column in &report.columns {
        println!(
            "{:<28} {:<10} {:<10}",
            truncate_str(&column.name, 27),
            column.dtype,
            column.non_null
        );
    }
    println!();

    println!(
        "Number of categories = {}",
        report.category_counts.distinct()
    );
    println!("Average app rating = {:.4}", report.average_rating);
    println!();

    println!("COLUMN STATISTICS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<10} {:>8} {:>12} {:>12} {:>10} {:>10} {:>12}",
        "Column", "Count", "Mean", "Std", "Min", "Median", "Max"
    );
    for stats in &report.column_stats {
        println!(
            "{:<10} {:>8} {:>12.3} {:>12.3} {:>10.3} {:>10.3} {:>12.3}",
            stats.column, stats.count, stats.mean, stats.std, stats.min, stats.median, stats.max
        );
    }
    println!();

    println!("APPS PRICED ABOVE {:.0}", report.premium_price_threshold);
    println!("{}", "-".repeat(40));
    if report.premium_apps.is_empty() {
        println!("  None");
    } else {
        println!("{:<20} {:<40} {:>8}", "Category", "App", "Price");
        for app in &report.premium_apps {
            println!(
                "{:<20} {:<40} {:>8.2}",
                truncate_str(&app.category, 19),
                truncate_str(&app.app, 39),
                app.price
            );
        }
    }
    println!();

    let views = &report.views;
    println!("Derived Views:");
    println!("  Rated and sized apps: {}", views.rated_and_sized);
    println!("  Apps in large categories: {}", views.large_categories);
    println!("  Paid apps (rated and sized): {}", views.paid_apps);
    println!("  Apps in popular categories: {}", views.popular_categories);
    println!("  Popular apps below price ceiling: {}", views.affordable_popular);
    println!();

    println!(
        "Merged reviews: {} ({} matched, {} dropped for missing sentiment or text)",
        report.join.rows, report.join.matched, report.join.dropped
    );
    println!();

    println!("Charts:");
    for chart in &report.charts {
        match &chart.file {
            Some(file) => println!("  - [{}] {} -> {}", chart.kind.as_str(), chart.title, file),
            None => println!("  - [{}] {} (not drawn)", chart.kind.as_str(), chart.title),
        }
    }
    println!();

    println!("Finished in {}ms", report.duration_ms);
    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
