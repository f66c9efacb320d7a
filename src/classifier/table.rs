//! Static keyword-to-category table
//!
//! The table is a JSON object `category -> [keyword, ...]`. Declaration order
//! is kept because classification ties resolve to the first-declared category.

use crate::classifier::ClassifierError;
use indexmap::IndexMap;
use std::path::Path;

/// Ordered mapping from category name to the keywords that signal it
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    categories: IndexMap<String, Vec<String>>,
}

impl KeywordTable {
    /// Builds a table from `(category, keywords)` pairs in declaration order
    ///
    /// # Example
    ///
    /// ```
    /// use directory_harvest::classifier::KeywordTable;
    ///
    /// let table = KeywordTable::from_entries(vec![
    ///     ("Tech", vec!["software", "app"]),
    ///     ("Food", vec!["restaurant"]),
    /// ])
    /// .unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_entries<C, K>(entries: Vec<(C, Vec<K>)>) -> Result<Self, ClassifierError>
    where
        C: Into<String>,
        K: Into<String>,
    {
        let categories = entries
            .into_iter()
            .map(|(category, keywords)| {
                (
                    category.into(),
                    keywords.into_iter().map(Into::into).collect(),
                )
            })
            .collect();

        Self::validated(categories)
    }

    /// Parses a table from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let categories: IndexMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::validated(categories)
    }

    /// Loads a table from a JSON file
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path).map_err(|source| ClassifierError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    fn validated(categories: IndexMap<String, Vec<String>>) -> Result<Self, ClassifierError> {
        // An empty keyword is a substring of every text and would match everything
        for (category, keywords) in categories.iter() {
            if keywords.iter().any(|k| k.is_empty()) {
                return Err(ClassifierError::EmptyKeyword(category.to_string()));
            }
        }
        Ok(Self { categories })
    }

    /// Iterates over categories in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories.iter().map(|(c, k)| (c.as_str(), k.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
