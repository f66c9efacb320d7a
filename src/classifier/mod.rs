//! Keyword-frequency industry classifier
//!
//! Maps a free-text signal (a company's tag list or its description) to the
//! category whose keywords occur most often in it.
//!
//! Matching is a case-sensitive substring test of each keyword exactly as
//! stored in the table; a keyword counts once per category no matter how many
//! times it occurs. Ties go to the category declared first in the table.

mod table;

pub use table::KeywordTable;

use thiserror::Error;

/// Category returned when no keyword matches
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Errors raised while loading a keyword table
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to read keyword table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse keyword table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Category '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

/// The text a company is classified from
#[derive(Debug, Clone, Copy)]
pub enum Signal<'a> {
    /// Tag list, joined with single spaces before matching
    Tags(&'a [String]),

    /// Free-text description, matched as is
    Description(&'a str),
}

impl Signal<'_> {
    /// Flattens the signal into the single string keywords are matched against
    fn analysis_text(&self) -> String {
        match self {
            Signal::Tags(tags) => tags.join(" "),
            Signal::Description(text) => text.to_string(),
        }
    }
}

/// Match count and share for one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: String,

    /// Number of the category's keywords found in the text
    pub matches: usize,

    /// `matches` as a percentage of all matches across categories
    pub percentage: f64,
}

/// Classifies companies into industries by keyword frequency
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: KeywordTable,
}

impl KeywordClassifier {
    /// Creates a classifier over a keyword table loaded once up front
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    /// Scores every category that has at least one keyword match
    ///
    /// Scores come back in table declaration order. Categories without a
    /// match are left out, so an empty result means nothing matched.
    pub fn scores(&self, signal: Signal<'_>) -> Vec<CategoryScore> {
        let text = signal.analysis_text();
        if text.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<CategoryScore> = self
            .table
            .iter()
            .filter_map(|(category, keywords)| {
                let matches = keywords.iter().filter(|k| text.contains(k.as_str())).count();
                (matches > 0).then(|| CategoryScore {
                    category: category.to_string(),
                    matches,
                    percentage: 0.0,
                })
            })
            .collect();

        let total: usize = scores.iter().map(|s| s.matches).sum();
        for score in &mut scores {
            score.percentage = score.matches as f64 / total as f64 * 100.0;
        }

        scores
    }

    /// Returns the best-matching category, or [`UNKNOWN_CATEGORY`]
    ///
    /// # Example
    ///
    /// ```
    /// use directory_harvest::classifier::{KeywordClassifier, KeywordTable, Signal};
    ///
    /// let table = KeywordTable::from_entries(vec![
    ///     ("Tech", vec!["software", "app"]),
    ///     ("Food", vec!["restaurant"]),
    /// ])
    /// .unwrap();
    /// let classifier = KeywordClassifier::new(table);
    ///
    /// let tags = vec!["We build software apps".to_string()];
    /// assert_eq!(classifier.classify(Signal::Tags(&tags)), "Tech");
    /// ```
    pub fn classify(&self, signal: Signal<'_>) -> String {
        let scores = self.scores(signal);

        // First strictly greater count wins, so earlier categories keep ties
        let mut best: Option<&CategoryScore> = None;
        for score in &scores {
            if best.map_or(true, |b| score.matches > b.matches) {
                best = Some(score);
            }
        }

        match best {
            Some(score) => {
                tracing::debug!(
                    category = %score.category,
                    matches = score.matches,
                    percentage = score.percentage,
                    candidates = scores.len(),
                    "Classified company"
                );
                score.category.clone()
            }
            None => UNKNOWN_CATEGORY.to_string(),
        }
    }
}
