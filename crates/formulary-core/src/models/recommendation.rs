//! Recommendation models for the substitute aggregator.

use serde::{Deserialize, Serialize};

/// One entry of a neighbor set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    /// Row index of the neighboring drug
    pub index: usize,
    /// Cosine distance to the query drug (0.0 = same direction)
    pub distance: f64,
}

/// A valid alternative slot resolved from some drug record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativeCandidate {
    /// Name of the suggested substitute
    pub substitute_name: String,
    /// Cost of the substitute (always finite)
    pub cost: f64,
    /// Drug whose alternative slots listed this substitute
    pub source_drug_name: String,
    /// Cost of the source drug, `None` when missing or unparsable
    pub source_drug_cost: Option<f64>,
}

impl AlternativeCandidate {
    /// Key used for substitute deduplication: trimmed, lowercased name.
    pub fn dedup_key(&self) -> String {
        self.substitute_name.trim().to_lowercase()
    }
}

/// Outcome of a single `recommend` query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResult {
    /// A substitute was chosen.
    Found {
        /// The reported substitute
        best: AlternativeCandidate,
        /// Remaining peer-derived candidates, cheapest first, never naming `best`
        others: Vec<AlternativeCandidate>,
    },
    /// The queried name is not in the dataset.
    NotFound { queried_name: String },
    /// Neither the drug nor any of its neighbors lists a usable substitute.
    NoAlternatives { queried_name: String },
}

impl RecommendationResult {
    /// The chosen candidate, if any.
    pub fn best(&self) -> Option<&AlternativeCandidate> {
        match self {
            RecommendationResult::Found { best, .. } => Some(best),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RecommendationResult::Found { .. })
    }
}
