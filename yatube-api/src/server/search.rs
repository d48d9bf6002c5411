//! Free text search over listings.

use serde::Deserialize;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

impl SearchParams {
    #[must_use]
    pub fn terms(&self) -> Vec<String> {
        self.search.as_deref().map(search_terms).unwrap_or_default()
    }
}

/// Splits a search string on whitespace and commas into lowercase terms.
#[must_use]
pub fn search_terms(search: &str) -> Vec<String> {
    search
        .replace('\0', "")
        .replace(',', " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Every term has to occur, case insensitively, in at least one of `fields`.
/// Terms are expected to be lowercase already, as produced by [`search_terms`].
#[must_use]
pub fn matches_all_terms(terms: &[String], fields: &[&str]) -> bool {
    let fields: Vec<String> = fields.iter().map(|field| field.to_lowercase()).collect();

    terms
        .iter()
        .all(|term| fields.iter().any(|field| field.contains(term.as_str())))
}
