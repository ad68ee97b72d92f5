//! Table schemas and the plain result types shared across the crate.

use serde::{Deserialize, Serialize};

/// Column names of the apps and reviews tables.
pub mod columns {
    pub const APP: &str = "App";
    pub const CATEGORY: &str = "Category";
    pub const RATING: &str = "Rating";
    pub const SIZE: &str = "Size";
    pub const INSTALLS: &str = "Installs";
    pub const TYPE: &str = "Type";
    pub const PRICE: &str = "Price";
    pub const REVIEW: &str = "Review";
    pub const SENTIMENT: &str = "Sentiment";
    pub const SENTIMENT_POLARITY: &str = "Sentiment_Polarity";
    pub const SENTIMENT_SUBJECTIVITY: &str = "Sentiment_Subjectivity";
}

/// Declared logical type of a column.
///
/// Every column is read as text; the declared kind decides what happens to
/// it once the table is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free text, kept as is.
    Text,
    /// Small set of labels, kept as text.
    Category,
    /// Number that may be absent.
    OptionalFloat,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Category => "category",
            Self::OptionalFloat => "float?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    pub fn required(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

/// Declared columns of a table. Columns not listed are loaded as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Schema of the apps table.
    ///
    /// `Installs` and `Price` are declared as text because they still carry
    /// formatting characters; the column cleaner turns them into numbers.
    pub fn apps() -> Self {
        use columns::*;
        Self {
            name: "apps".to_string(),
            columns: vec![
                ColumnSpec::required(APP, ColumnKind::Text),
                ColumnSpec::required(CATEGORY, ColumnKind::Category),
                ColumnSpec::required(RATING, ColumnKind::OptionalFloat),
                ColumnSpec::required(SIZE, ColumnKind::OptionalFloat),
                ColumnSpec::required(INSTALLS, ColumnKind::Text),
                ColumnSpec::required(TYPE, ColumnKind::Category),
                ColumnSpec::required(PRICE, ColumnKind::Text),
            ],
        }
    }

    /// Schema of the user reviews table.
    pub fn reviews() -> Self {
        use columns::*;
        Self {
            name: "reviews".to_string(),
            columns: vec![
                ColumnSpec::required(APP, ColumnKind::Text),
                ColumnSpec::required(REVIEW, ColumnKind::Text),
                ColumnSpec::required(SENTIMENT, ColumnKind::Category),
                ColumnSpec::required(SENTIMENT_POLARITY, ColumnKind::OptionalFloat),
                ColumnSpec::optional(SENTIMENT_SUBJECTIVITY, ColumnKind::OptionalFloat),
            ],
        }
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name.as_str())
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }
}

/// Number of apps per category, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub counts: Vec<(String, usize)>,
}

impl CategoryCounts {
    /// Number of distinct categories.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub null_count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// A single row of the "priced above threshold" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedApp {
    pub category: String,
    pub app: String,
    pub price: f64,
}
