//! Fuzzy name suggestions for queries that do not resolve.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::Catalog;

/// Weight of Jaro-Winkler in the combined score (Levenshtein gets the rest).
const JARO_WINKLER_WEIGHT: f64 = 0.6;

/// Minimum combined score for a name to be suggested.
const MIN_SUGGESTION_SCORE: f64 = 0.5;

/// A known drug name close to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameSuggestion {
    pub name: String,
    /// Combined similarity in [0, 1]
    pub score: f64,
}

fn name_score(query: &str, name: &str) -> f64 {
    let name = name.to_lowercase();
    JARO_WINKLER_WEIGHT * jaro_winkler(query, &name)
        + (1.0 - JARO_WINKLER_WEIGHT) * normalized_levenshtein(query, &name)
}

/// Up to `limit` catalog names closest to `query`, best first.
pub fn suggest_names(catalog: &Catalog, query: &str, limit: usize) -> Vec<NameSuggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut suggestions: Vec<NameSuggestion> = catalog
        .names()
        .map(|name| NameSuggestion {
            name: name.to_string(),
            score: name_score(&query, name),
        })
        .filter(|s| s.score >= MIN_SUGGESTION_SCORE)
        .collect();

    // stable: equal scores keep load order
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions.truncate(limit);
    suggestions
}
