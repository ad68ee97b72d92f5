//! Inner join of user reviews onto apps.

use crate::error::Result;
use crate::types::columns;
use crate::utils::{column_names, require_column, string_values};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Suffix given to right-hand columns whose names collide with the left.
pub const RIGHT_SUFFIX: &str = "_right";

/// Merged table together with the row accounting of the join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub frame: DataFrame,
    /// Rows produced by the key match, before dropping incomplete reviews.
    pub matched: usize,
    /// Matched rows discarded for a missing `Sentiment` or `Review`.
    pub dropped: usize,
}

impl JoinOutcome {
    pub fn summary(&self) -> JoinSummary {
        JoinSummary {
            matched: self.matched,
            dropped: self.dropped,
            rows: self.frame.height(),
        }
    }
}

/// Row counts of a join, without the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub matched: usize,
    pub dropped: usize,
    pub rows: usize,
}

pub struct ReviewJoiner;

impl ReviewJoiner {
    /// Inner-join `reviews` onto `apps` on the `App` column.
    ///
    /// Rows come out in apps order and, within one app, in reviews order. The
    /// reviews' `App` column is dropped; any other shared column name gets
    /// the [`RIGHT_SUFFIX`]. Rows whose `Sentiment` or `Review` is null are
    /// removed afterwards.
    pub fn join(apps: &DataFrame, reviews: &DataFrame) -> Result<JoinOutcome> {
        let app_keys = string_values(apps, columns::APP)?;
        let review_keys = string_values(reviews, columns::APP)?;
        require_column(reviews, columns::SENTIMENT)?;
        require_column(reviews, columns::REVIEW)?;

        let mut reviews_by_app: HashMap<&str, Vec<IdxSize>> = HashMap::new();
        for (idx, key) in review_keys.iter().enumerate() {
            if let Some(key) = key {
                reviews_by_app
                    .entry(key.as_str())
                    .or_default()
                    .push(idx as IdxSize);
            }
        }

        let mut left_idx: Vec<IdxSize> = Vec::new();
        let mut right_idx: Vec<IdxSize> = Vec::new();
        for (idx, key) in app_keys.iter().enumerate() {
            let Some(matches) = key.as_deref().and_then(|k| reviews_by_app.get(k)) else {
                continue;
            };
            for &review in matches {
                left_idx.push(idx as IdxSize);
                right_idx.push(review);
            }
        }

        let left = apps.take(&IdxCa::from_vec("left".into(), left_idx))?;
        let right = reviews
            .take(&IdxCa::from_vec("right".into(), right_idx))?
            .drop(columns::APP)?;
        let right = Self::suffix_collisions(right, &column_names(&left))?;

        let joined = left.hstack(right.get_columns())?;
        let matched = joined.height();
        debug!("Key match produced {} rows", matched);

        let frame = joined
            .lazy()
            .filter(
                col(columns::SENTIMENT)
                    .is_not_null()
                    .and(col(columns::REVIEW).is_not_null()),
            )
            .collect()?;
        let dropped = matched - frame.height();

        info!(
            "Merged {} reviews onto apps ({} dropped for missing sentiment or text)",
            frame.height(),
            dropped
        );

        Ok(JoinOutcome {
            frame,
            matched,
            dropped,
        })
    }

    fn suffix_collisions(mut right: DataFrame, left_names: &[String]) -> Result<DataFrame> {
        for name in column_names(&right) {
            if left_names.contains(&name) {
                right.rename(&name, format!("{name}{RIGHT_SUFFIX}").into())?;
            }
        }
        Ok(right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use pretty_assertions::assert_eq;

    fn apps() -> DataFrame {
        df! {
            "App" => ["Zeta", "Alpha", "Lonely"],
            "Type" => ["Free", "Paid", "Free"],
            "Price" => [0.0, 1.99, 0.0],
        }
        .unwrap()
    }

    fn reviews() -> DataFrame {
        df! {
            "App" => ["Alpha", "Zeta", "Alpha", "Ghost", "Zeta"],
            "Review" => [Some("ok"), Some("great"), None, Some("boo"), Some("fine")],
            "Sentiment" => [Some("Neutral"), Some("Positive"), None, Some("Negative"), Some("Positive")],
            "Sentiment_Polarity" => [Some(0.0), Some(0.9), None, Some(-0.5), Some(0.4)],
        }
        .unwrap()
    }

    #[test]
    fn test_join_orders_by_apps_then_reviews() {
        let outcome = ReviewJoiner::join(&apps(), &reviews()).unwrap();

        assert_eq!(outcome.matched, 4);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(
            string_values(&outcome.frame, "Review").unwrap(),
            vec![
                Some("great".to_string()),
                Some("fine".to_string()),
                Some("ok".to_string()),
            ]
        );
        assert_eq!(
            string_values(&outcome.frame, "App").unwrap(),
            vec![
                Some("Zeta".to_string()),
                Some("Zeta".to_string()),
                Some("Alpha".to_string()),
            ]
        );
    }

    #[test]
    fn test_join_drops_right_key_and_keeps_both_sides() {
        let outcome = ReviewJoiner::join(&apps(), &reviews()).unwrap();
        assert_eq!(
            column_names(&outcome.frame),
            vec!["App", "Type", "Price", "Review", "Sentiment", "Sentiment_Polarity"]
        );
        assert_eq!(outcome.summary().rows, 3);
    }

    #[test]
    fn test_join_suffixes_colliding_columns() {
        let apps = df! { "App" => ["A"], "Genres" => ["Tools"] }.unwrap();
        let reviews = df! {
            "App" => ["A"],
            "Genres" => ["Other"],
            "Review" => ["nice"],
            "Sentiment" => ["Positive"],
        }
        .unwrap();

        let outcome = ReviewJoiner::join(&apps, &reviews).unwrap();
        assert!(outcome.frame.column("Genres_right").is_ok());
        assert_eq!(outcome.frame.height(), 1);
    }

    #[test]
    fn test_join_without_matches_is_empty() {
        let apps = df! { "App" => ["Nobody"] }.unwrap();
        let outcome = ReviewJoiner::join(&apps, &reviews()).unwrap();
        assert_eq!(outcome.frame.height(), 0);
        assert_eq!(outcome.matched, 0);
    }

    #[test]
    fn test_join_missing_key_column() {
        let apps = df! { "Name" => ["A"] }.unwrap();
        assert!(matches!(
            ReviewJoiner::join(&apps, &reviews()),
            Err(AnalysisError::ColumnNotFound(c)) if c == "App"
        ));
    }
}
