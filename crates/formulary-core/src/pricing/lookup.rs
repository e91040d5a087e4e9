//! Real-time formulary lookup for a single drug.
//!
//! Unlike the recommender this is a direct column scan: the base cost and
//! the five slot costs are compared as stored, with no similarity search.

use serde::{Deserialize, Serialize};

use crate::models::{DrugRecord, RawCost, ALTERNATIVE_SLOTS};

/// Cost and best-option view of one drug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormularyLookup {
    /// Whether the drug exists in the store
    pub exists: bool,
    pub medicine: String,
    pub drug_cost: Option<f64>,
    /// Cheapest option among the drug itself and its listed alternatives
    pub cheapest_option: String,
    pub cheapest_cost: Option<f64>,
    /// Saving of the cheapest option vs. the base cost, in percent (2 decimals)
    pub saving_percent: f64,
    pub insurance_drug: Option<String>,
    pub insurance_final_cost: Option<f64>,
    /// min(cheapest cost, insurance final cost)
    pub effective_cost: Option<f64>,
}

impl FormularyLookup {
    /// Result for a drug that is not in the store: keep using the same drug.
    pub fn unknown(medicine: &str) -> Self {
        Self {
            exists: false,
            medicine: medicine.to_string(),
            drug_cost: None,
            cheapest_option: medicine.to_string(),
            cheapest_cost: None,
            saving_percent: 0.0,
            insurance_drug: None,
            insurance_final_cost: None,
            effective_cost: None,
        }
    }
}

/// Usable stored cost: finite and non-zero (zero means "not entered").
fn stored_cost(cost: Option<&RawCost>) -> Option<f64> {
    cost.map(RawCost::value)
        .filter(|c| c.is_finite() && *c != 0.0)
}

/// Compute the lookup view for an existing record.
pub fn lookup_record(record: &DrugRecord) -> FormularyLookup {
    let base = stored_cost(record.base_cost.as_ref());

    // Base column first, then slots in order; first minimum wins.
    let mut cheapest: Option<(String, f64)> = base.map(|c| (record.name.clone(), c));
    for (i, slot) in record.alternatives.iter().take(ALTERNATIVE_SLOTS).enumerate() {
        let Some(cost) = stored_cost(slot.cost.as_ref()) else {
            continue;
        };
        if cheapest.as_ref().map_or(true, |(_, best)| cost < *best) {
            let name = slot
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Alternative_{}", i + 1));
            cheapest = Some((name, cost));
        }
    }

    let (cheapest_option, cheapest_cost) = match cheapest {
        Some((name, cost)) => (name, Some(cost)),
        None => (record.name.clone(), None),
    };

    let saving_percent = match (base, cheapest_cost) {
        (Some(base), Some(cheapest)) => round2((base - cheapest) * 100.0 / base),
        _ => 0.0,
    };

    let insurance_final_cost = record.insurance_cost_value();
    let effective_cost = match (cheapest_cost, insurance_final_cost.filter(|c| *c != 0.0)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    FormularyLookup {
        exists: true,
        medicine: record.name.clone(),
        drug_cost: record.base_cost_value(),
        cheapest_option,
        cheapest_cost,
        saving_percent,
        insurance_drug: record.insurance_drug.clone(),
        insurance_final_cost,
        effective_cost,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlternativeSlot;

    #[test]
    fn test_cheapest_alternative_and_saving() {
        let record = DrugRecord::new("Lipitor")
            .with_base_cost(40.0)
            .with_alternative("Atorvastatin", 10.0)
            .with_alternative("Simvastatin", 30.0);

        let info = lookup_record(&record);
        assert!(info.exists);
        assert_eq!(info.cheapest_option, "Atorvastatin");
        assert_eq!(info.cheapest_cost, Some(10.0));
        assert_eq!(info.saving_percent, 75.0);
        assert_eq!(info.effective_cost, Some(10.0));
    }

    #[test]
    fn test_base_wins_when_cheapest() {
        let record = DrugRecord::new("Generic")
            .with_base_cost(5.0)
            .with_alternative("Brand", 5.0);

        let info = lookup_record(&record);
        assert_eq!(info.cheapest_option, "Generic");
        assert_eq!(info.saving_percent, 0.0);
    }

    #[test]
    fn test_zero_costs_ignored() {
        let record = DrugRecord::new("Drug")
            .with_base_cost(12.0)
            .with_alternative("Free", 0.0)
            .with_alternative("Cheap", 3.0);

        let info = lookup_record(&record);
        assert_eq!(info.cheapest_option, "Cheap");
        assert_eq!(info.cheapest_cost, Some(3.0));
    }

    #[test]
    fn test_unnamed_slot_gets_column_label() {
        let mut record = DrugRecord::new("Drug").with_base_cost(12.0);
        record.alternatives.push(AlternativeSlot::default());
        record.alternatives.push(AlternativeSlot {
            name: None,
            cost: Some(RawCost::Number(2.0)),
        });

        assert_eq!(lookup_record(&record).cheapest_option, "Alternative_2");
    }

    #[test]
    fn test_insurance_lowers_effective_cost() {
        let record = DrugRecord::new("Drug")
            .with_base_cost(30.0)
            .with_alternative("Alt", 20.0)
            .with_insurance("Covered", 8.0);

        let info = lookup_record(&record);
        assert_eq!(info.cheapest_cost, Some(20.0));
        assert_eq!(info.effective_cost, Some(8.0));
        assert_eq!(info.insurance_drug.as_deref(), Some("Covered"));
    }

    #[test]
    fn test_saving_rounded() {
        let record = DrugRecord::new("Drug")
            .with_base_cost(3.0)
            .with_alternative("Alt", 2.0);
        assert_eq!(lookup_record(&record).saving_percent, 33.33);
    }

    #[test]
    fn test_no_costs_at_all() {
        let info = lookup_record(&DrugRecord::new("Mystery"));
        assert!(info.exists);
        assert_eq!(info.cheapest_option, "Mystery");
        assert_eq!(info.cheapest_cost, None);
        assert_eq!(info.saving_percent, 0.0);
        assert_eq!(info.effective_cost, None);
    }

    #[test]
    fn test_unknown() {
        let info = FormularyLookup::unknown("NewDrug");
        assert!(!info.exists);
        assert_eq!(info.cheapest_option, "NewDrug");
    }
}
