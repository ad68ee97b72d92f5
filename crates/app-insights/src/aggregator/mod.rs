//! Read-only aggregations over the cleaned apps table.
//!
//! The [`Aggregator`] borrows the cleaned frame and never changes it; every
//! derived view is a new DataFrame. The free functions [`series_pairs`] and
//! [`grouped_values`] turn frames into the plain vectors the charts consume.

pub(crate) mod statistics;

use crate::error::{AnalysisError, Result};
use crate::types::{CategoryCounts, ColumnStats, PricedApp, columns};
use crate::utils::{f64_values, require_column, string_values};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use tracing::{debug, info};

/// Row filter over the cleaned apps table.
#[derive(Debug, Clone, PartialEq)]
pub enum AppPredicate {
    /// `Type` equals the given label (`"Free"` or `"Paid"`).
    TypeIs(String),
    /// `Price` strictly greater than the bound.
    PriceAbove(f64),
    /// `Price` strictly less than the bound.
    PriceBelow(f64),
    /// `Category` is one of the listed labels.
    CategoryIn(Vec<String>),
}

impl AppPredicate {
    fn column(&self) -> &'static str {
        match self {
            Self::TypeIs(_) => columns::TYPE,
            Self::PriceAbove(_) | Self::PriceBelow(_) => columns::PRICE,
            Self::CategoryIn(_) => columns::CATEGORY,
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Self::TypeIs(label) => col(columns::TYPE).eq(lit(label.as_str())),
            Self::PriceAbove(bound) => col(columns::PRICE).gt(lit(*bound)),
            Self::PriceBelow(bound) => col(columns::PRICE).lt(lit(*bound)),
            Self::CategoryIn(labels) => labels.iter().fold(lit(false), |acc, label| {
                acc.or(col(columns::CATEGORY).eq(lit(label.as_str())))
            }),
        }
    }
}

impl std::fmt::Display for AppPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeIs(label) => write!(f, "Type == {label}"),
            Self::PriceAbove(bound) => write!(f, "Price > {bound}"),
            Self::PriceBelow(bound) => write!(f, "Price < {bound}"),
            Self::CategoryIn(labels) => write!(f, "Category in [{}]", labels.join(", ")),
        }
    }
}

/// Aggregations over a cleaned apps table.
pub struct Aggregator<'a> {
    apps: &'a DataFrame,
}

impl<'a> Aggregator<'a> {
    pub fn new(apps: &'a DataFrame) -> Self {
        Self { apps }
    }

    /// Number of apps per category, largest first.
    ///
    /// Ties keep the order in which the categories first appear. Rows with a
    /// null category are not counted.
    pub fn category_counts(&self) -> Result<CategoryCounts> {
        let categories = string_values(self.apps, columns::CATEGORY)?;
        let counts = count_first_seen(categories.iter().flatten().map(String::as_str));

        debug!("{} distinct categories", counts.len());
        Ok(CategoryCounts { counts })
    }

    /// Mean of the non-null ratings.
    pub fn average_rating(&self) -> Result<f64> {
        let ratings: Vec<f64> = f64_values(self.apps, columns::RATING)?
            .into_iter()
            .flatten()
            .collect();

        if ratings.is_empty() {
            return Err(AnalysisError::EmptyInput("average rating".to_string()));
        }

        Ok(statistics::mean(&ratings))
    }

    /// Rows that have both a rating and a size.
    pub fn rated_and_sized(&self) -> Result<DataFrame> {
        require_column(self.apps, columns::RATING)?;
        require_column(self.apps, columns::SIZE)?;

        let df = self
            .apps
            .clone()
            .lazy()
            .filter(
                col(columns::RATING)
                    .is_not_null()
                    .and(col(columns::SIZE).is_not_null()),
            )
            .collect()?;

        debug!("{} of {} rows rated and sized", df.height(), self.apps.height());
        Ok(df)
    }

    /// Rated-and-sized rows whose category has at least `min_size` such rows.
    pub fn large_categories(&self, min_size: usize) -> Result<DataFrame> {
        let subset = self.rated_and_sized()?;
        let categories = string_values(&subset, columns::CATEGORY)?;

        let counts = count_first_seen(categories.iter().flatten().map(String::as_str));
        let sizes: HashMap<&str, usize> = counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();

        let mask: Vec<bool> = categories
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|name| sizes.get(name))
                    .is_some_and(|count| *count >= min_size)
            })
            .collect();
        let mask = BooleanChunked::from_slice("large_category".into(), &mask);

        let df = subset.filter(&mask)?;
        info!(
            "Large categories (>= {} apps): {} rows kept",
            min_size,
            df.height()
        );
        Ok(df)
    }

    /// Keep the rows of `df` matching `predicate`, in their original order.
    pub fn filter_by_predicate(df: &DataFrame, predicate: &AppPredicate) -> Result<DataFrame> {
        require_column(df, predicate.column())?;

        let filtered = df.clone().lazy().filter(predicate.to_expr()).collect()?;
        debug!("Filter {}: {} -> {} rows", predicate, df.height(), filtered.height());
        Ok(filtered)
    }

    /// Apps priced strictly above `threshold`, as (Category, App, Price).
    pub fn priced_above(&self, threshold: f64) -> Result<Vec<PricedApp>> {
        let df = Self::filter_by_predicate(self.apps, &AppPredicate::PriceAbove(threshold))?;

        let categories = string_values(&df, columns::CATEGORY)?;
        let apps = string_values(&df, columns::APP)?;
        let prices = f64_values(&df, columns::PRICE)?;

        Ok(categories
            .into_iter()
            .zip(apps)
            .zip(prices)
            .map(|((category, app), price)| PricedApp {
                category: category.unwrap_or_default(),
                app: app.unwrap_or_default(),
                price: price.unwrap_or_default(),
            })
            .collect())
    }

    /// Descriptive statistics of a numeric column.
    pub fn describe_column(&self, name: &str) -> Result<ColumnStats> {
        let column = require_column(self.apps, name)?;
        statistics::describe_series(column.as_materialized_series())
    }

    /// Column names with their data types, in table order.
    pub fn column_types(&self) -> Vec<(String, String)> {
        self.apps
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect()
    }

    /// Random sample of up to `n` rows; deterministic when `seed` is given.
    pub fn sample_rows(&self, n: usize, seed: Option<u64>) -> Result<DataFrame> {
        let height = self.apps.height();
        let amount = n.min(height);

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let picked: Vec<IdxSize> = rand::seq::index::sample(&mut rng, height, amount)
            .into_iter()
            .map(|i| i as IdxSize)
            .collect();

        let idx = IdxCa::from_vec("sample".into(), picked);
        Ok(self.apps.take(&idx)?)
    }

    /// `ln(1 + installs)` grouped by `Type`, groups in first-seen order.
    pub fn log_installs_by_type(&self) -> Result<Vec<(String, Vec<f64>)>> {
        let groups = grouped_values(self.apps, columns::TYPE, columns::INSTALLS)?;
        Ok(groups
            .into_iter()
            .map(|(label, values)| (label, values.into_iter().map(f64::ln_1p).collect()))
            .collect())
    }
}

/// `(x, y)` pairs for every row where both columns are non-null.
pub fn series_pairs(df: &DataFrame, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
    let xs = f64_values(df, x)?;
    let ys = f64_values(df, y)?;

    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect())
}

/// Non-null `value`s grouped by non-null `group` labels, in first-seen order.
pub fn grouped_values(df: &DataFrame, group: &str, value: &str) -> Result<Vec<(String, Vec<f64>)>> {
    let labels = string_values(df, group)?;
    let values = f64_values(df, value)?;

    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (label, value) in labels.into_iter().zip(values) {
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };
        let pos = *positions.entry(label.clone()).or_insert_with(|| {
            groups.push((label, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(value);
    }

    Ok(groups)
}

/// Count labels, sorted by count descending with ties in first-seen order.
fn count_first_seen<'s>(labels: impl Iterator<Item = &'s str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<&'s str, usize> = HashMap::new();

    for label in labels {
        match positions.get(label) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(label, counts.len());
                counts.push((label.to_string(), 1));
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaned_apps() -> DataFrame {
        df! {
            "App" => ["A", "B", "C", "D", "E", "F"],
            "Category" => [Some("TOOLS"), Some("GAME"), Some("GAME"), Some("TOOLS"), Some("MEDICAL"), None],
            "Rating" => [Some(4.0), Some(3.0), None, Some(5.0), Some(4.5), Some(2.0)],
            "Size" => [Some(10.0), Some(20.0), Some(5.0), None, Some(1.0), Some(3.0)],
            "Installs" => [0.0, 99.0, 1000.0, 10.0, 5.0, 1.0],
            "Type" => ["Free", "Paid", "Free", "Paid", "Paid", "Free"],
            "Price" => [0.0, 2.99, 0.0, 250.0, 99.5, 0.0],
        }
        .unwrap()
    }

    fn apps_of(df: &DataFrame) -> Vec<String> {
        string_values(df, "App")
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_category_counts_sorted_with_first_seen_ties() {
        let df = cleaned_apps();
        let counts = Aggregator::new(&df).category_counts().unwrap();

        assert_eq!(
            counts.counts,
            vec![
                ("TOOLS".to_string(), 2),
                ("GAME".to_string(), 2),
                ("MEDICAL".to_string(), 1),
            ]
        );
        assert_eq!(counts.distinct(), 3);
    }

    #[test]
    fn test_average_rating_ignores_nulls() {
        let df = cleaned_apps();
        let avg = Aggregator::new(&df).average_rating().unwrap();
        assert!((avg - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_average_rating_without_ratings() {
        let df = df! { "Rating" => [None::<f64>, None] }.unwrap();
        assert!(matches!(
            Aggregator::new(&df).average_rating(),
            Err(AnalysisError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_rated_and_sized() {
        let df = cleaned_apps();
        let subset = Aggregator::new(&df).rated_and_sized().unwrap();
        assert_eq!(apps_of(&subset), vec!["A", "B", "E", "F"]);
    }

    #[test]
    fn test_large_categories_threshold() {
        let df = df! {
            "App" => ["A", "B", "C", "D", "E"],
            "Category" => ["GAME", "TOOLS", "GAME", "GAME", "TOOLS"],
            "Rating" => [Some(4.0), Some(3.0), Some(4.1), Some(4.2), None],
            "Size" => [1.0, 2.0, 3.0, 4.0, 5.0],
        }
        .unwrap();
        let aggregator = Aggregator::new(&df);

        // TOOLS has one rated row only, so it drops out at min_size 2
        let large = aggregator.large_categories(2).unwrap();
        assert_eq!(apps_of(&large), vec!["A", "C", "D"]);

        let none = aggregator.large_categories(4).unwrap();
        assert_eq!(none.height(), 0);
    }

    #[test]
    fn test_large_categories_at_default_minimum() {
        let categories: Vec<&str> = (0..400)
            .map(|i| if i % 4 == 3 { "TOOLS" } else { "GAME" })
            .collect();
        let apps: Vec<String> = (0..400).map(|i| format!("app-{i}")).collect();
        let df = df! {
            "App" => apps,
            "Category" => categories,
            "Rating" => vec![4.0; 400],
            "Size" => vec![10.0; 400],
        }
        .unwrap();

        let min_size = crate::config::AnalysisConfig::default().large_category_min_size;
        assert_eq!(min_size, 250);

        let large = Aggregator::new(&df).large_categories(min_size).unwrap();
        let kept = string_values(&large, "Category").unwrap();
        assert_eq!(large.height(), 300);
        assert!(kept.iter().all(|c| c.as_deref() == Some("GAME")));
        assert_eq!(apps_of(&large)[..3], ["app-0", "app-1", "app-2"]);
    }

    #[test]
    fn test_average_rating_skips_missing() {
        let df = df! { "Rating" => [Some(4.0), None, Some(5.0)] }.unwrap();
        let avg = Aggregator::new(&df).average_rating().unwrap();
        assert!((avg - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_filter_by_predicate() {
        let df = cleaned_apps();

        let paid = Aggregator::filter_by_predicate(&df, &AppPredicate::TypeIs("Paid".into())).unwrap();
        assert_eq!(apps_of(&paid), vec!["B", "D", "E"]);

        let cheap = Aggregator::filter_by_predicate(&df, &AppPredicate::PriceBelow(100.0)).unwrap();
        assert_eq!(apps_of(&cheap), vec!["A", "B", "C", "E", "F"]);

        let popular = Aggregator::filter_by_predicate(
            &df,
            &AppPredicate::CategoryIn(vec!["GAME".into(), "MEDICAL".into()]),
        )
        .unwrap();
        assert_eq!(apps_of(&popular), vec!["B", "C", "E"]);
    }

    #[test]
    fn test_filter_by_predicate_missing_column() {
        let df = df! { "App" => ["A"] }.unwrap();
        assert!(matches!(
            Aggregator::filter_by_predicate(&df, &AppPredicate::PriceAbove(1.0)),
            Err(AnalysisError::ColumnNotFound(c)) if c == "Price"
        ));
    }

    #[test]
    fn test_priced_above() {
        let df = cleaned_apps();
        let premium = Aggregator::new(&df).priced_above(200.0).unwrap();
        assert_eq!(
            premium,
            vec![PricedApp {
                category: "TOOLS".to_string(),
                app: "D".to_string(),
                price: 250.0,
            }]
        );
    }

    #[test]
    fn test_sample_rows_seeded() {
        let df = cleaned_apps();
        let aggregator = Aggregator::new(&df);

        let first = aggregator.sample_rows(3, Some(7)).unwrap();
        let second = aggregator.sample_rows(3, Some(7)).unwrap();
        assert_eq!(first.height(), 3);
        assert!(first.equals_missing(&second));

        assert_eq!(aggregator.sample_rows(50, None).unwrap().height(), 6);
    }

    #[test]
    fn test_log_installs_by_type() {
        let df = cleaned_apps();
        let groups = Aggregator::new(&df).log_installs_by_type().unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Free");
        assert_eq!(groups[0].1[0], 0.0);
        assert!((groups[1].1[0] - 100f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_series_pairs_skips_nulls() {
        let df = cleaned_apps();
        let pairs = series_pairs(&df, "Size", "Rating").unwrap();
        assert_eq!(pairs, vec![(10.0, 4.0), (20.0, 3.0), (1.0, 4.5), (3.0, 2.0)]);
    }

    #[test]
    fn test_describe_and_column_types() {
        let df = cleaned_apps();
        let aggregator = Aggregator::new(&df);

        let stats = aggregator.describe_column("Price").unwrap();
        assert_eq!(stats.count, 6);
        assert_eq!(stats.max, 250.0);

        let types = aggregator.column_types();
        assert_eq!(types[0], ("App".to_string(), "str".to_string()));
        assert_eq!(types[6], ("Price".to_string(), "f64".to_string()));
    }
}
