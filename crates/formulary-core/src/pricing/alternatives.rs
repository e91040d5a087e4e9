//! Alternative extraction from a record's substitute slots.

use serde::{Deserialize, Serialize};

use crate::models::{is_null_marker, AlternativeCandidate, DrugRecord, ALTERNATIVE_SLOTS};

/// A valid (substitute name, cost) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedAlternative {
    pub name: String,
    pub cost: f64,
}

impl PricedAlternative {
    /// Attach provenance from the record that listed this substitute.
    pub fn into_candidate(self, source: &DrugRecord) -> AlternativeCandidate {
        AlternativeCandidate {
            substitute_name: self.name,
            cost: self.cost,
            source_drug_name: source.name.clone(),
            source_drug_cost: source.base_cost_value(),
        }
    }
}

/// Extract the valid alternatives of a record, cheapest first.
///
/// Slots are scanned 1 through 5. A slot is kept when its name is non-empty
/// after trimming, is not a null marker, and its cost parses to a finite
/// value. Equal costs keep slot order.
pub fn extract_alternatives(record: &DrugRecord) -> Vec<PricedAlternative> {
    let mut pairs: Vec<PricedAlternative> = record
        .alternatives
        .iter()
        .take(ALTERNATIVE_SLOTS)
        .filter_map(|slot| {
            let name = slot.name.as_deref()?.trim();
            if name.is_empty() || is_null_marker(name) {
                return None;
            }
            let cost = slot.cost.as_ref()?.value();
            if !cost.is_finite() {
                return None;
            }
            Some(PricedAlternative {
                name: name.to_string(),
                cost,
            })
        })
        .collect();

    // sort_by is stable
    pairs.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    pairs
}

/// Cheapest valid alternative of a record, as a candidate.
pub fn cheapest_alternative(record: &DrugRecord) -> Option<AlternativeCandidate> {
    extract_alternatives(record)
        .into_iter()
        .next()
        .map(|alt| alt.into_candidate(record))
}
