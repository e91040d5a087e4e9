//! Recommendation aggregation over a built index.

use std::collections::HashMap;

use super::{BuiltIndex, RecommendResult};
use crate::models::{AlternativeCandidate, Catalog, Neighbor, RecommendationResult};
use crate::pricing::cheapest_alternative;

/// Cheapest listed substitute of each neighbor, deduplicated and cheapest first.
///
/// Each neighbor contributes at most its own cheapest slot. When two
/// neighbors name the same substitute (trimmed, case-insensitive) the lower
/// cost is kept; on equal cost the closer neighbor wins.
pub fn peer_candidates(catalog: &Catalog, neighbors: &[Neighbor]) -> Vec<AlternativeCandidate> {
    let mut candidates: Vec<AlternativeCandidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for neighbor in neighbors {
        let Some(candidate) = catalog.get(neighbor.index).and_then(cheapest_alternative) else {
            continue;
        };
        match positions.get(&candidate.dedup_key()) {
            Some(&pos) => {
                if candidate.cost < candidates[pos].cost {
                    candidates[pos] = candidate;
                }
            }
            None => {
                positions.insert(candidate.dedup_key(), candidates.len());
                candidates.push(candidate);
            }
        }
    }

    candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    candidates
}

/// Recommend the substitute for `query` using the `k` nearest peers.
///
/// The query drug's own cheapest listed substitute always wins when it has
/// one, even over a cheaper peer-derived substitute. Otherwise the cheapest
/// peer candidate is reported.
pub fn recommend(built: &BuiltIndex, query: &str, k: usize) -> RecommendResult<RecommendationResult> {
    let Some((index, record)) = built.catalog().find(query) else {
        tracing::debug!(query, "drug not found");
        return Ok(RecommendationResult::NotFound {
            queried_name: query.to_string(),
        });
    };

    let own = cheapest_alternative(record);
    let neighbors = built.index().neighbors(index, k)?;
    let mut peers = peer_candidates(built.catalog(), &neighbors);

    let best = match own {
        Some(candidate) => candidate,
        None if peers.is_empty() => {
            tracing::debug!(query, index, peers = neighbors.len(), "no alternatives in neighborhood");
            return Ok(RecommendationResult::NoAlternatives {
                queried_name: query.to_string(),
            });
        }
        None => peers.remove(0),
    };

    let best_key = best.dedup_key();
    peers.retain(|candidate| candidate.dedup_key() != best_key);

    tracing::debug!(
        query,
        index,
        substitute = %best.substitute_name,
        source = %best.source_drug_name,
        others = peers.len(),
        "recommendation found"
    );

    Ok(RecommendationResult::Found { best, others: peers })
}
