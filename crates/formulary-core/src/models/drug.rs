//! Drug formulary records.

use serde::{Deserialize, Serialize};

use crate::pricing::parse_cost;

/// Number of (alternative, cost) slots carried by each record.
pub const ALTERNATIVE_SLOTS: usize = 5;

/// Values that mean "no data" in source exports.
const NULL_MARKERS: &[&str] = &["null", "none", "nan", "n/a", "na"];

/// Check whether a string is an explicit null marker (case-insensitive).
pub fn is_null_marker(value: &str) -> bool {
    let trimmed = value.trim();
    NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Normalize an optional text field at the load boundary.
///
/// Blank strings and null markers become `None`; everything else is trimmed.
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || is_null_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A cost as it arrives from a data source: already numeric, or free text
/// such as `"$12.50"` that still needs parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawCost {
    Number(f64),
    Text(String),
}

impl RawCost {
    /// Parse into a finite cost, or the invalid-cost sentinel.
    pub fn value(&self) -> f64 {
        match self {
            RawCost::Number(n) => parse_cost(&n.to_string()),
            RawCost::Text(s) => parse_cost(s),
        }
    }
}

impl From<f64> for RawCost {
    fn from(value: f64) -> Self {
        RawCost::Number(value)
    }
}

impl From<&str> for RawCost {
    fn from(value: &str) -> Self {
        RawCost::Text(value.to_string())
    }
}

/// One listed substitute for a drug.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlternativeSlot {
    /// Substitute drug name
    pub name: Option<String>,
    /// Substitute cost, unparsed
    pub cost: Option<RawCost>,
}

impl AlternativeSlot {
    pub fn new(name: impl Into<String>, cost: impl Into<RawCost>) -> Self {
        Self {
            name: Some(name.into()),
            cost: Some(cost.into()),
        }
    }
}

/// A single row of the drug dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugRecord {
    /// Medicine name - the lookup key
    pub name: String,
    /// Therapeutic class (e.g., "Analgesic")
    pub therapeutic_class: Option<String>,
    /// Indication / use (e.g., "pain relief")
    pub indication: Option<String>,
    /// Cost of the drug itself
    pub base_cost: Option<RawCost>,
    /// Listed substitutes, slot 1 first
    pub alternatives: Vec<AlternativeSlot>,
    /// Drug covered by insurance, if any
    pub insurance_drug: Option<String>,
    /// Final cost after insurance
    pub insurance_final_cost: Option<RawCost>,
}

impl DrugRecord {
    /// Create a record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            therapeutic_class: None,
            indication: None,
            base_cost: None,
            alternatives: Vec::new(),
            insurance_drug: None,
            insurance_final_cost: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.therapeutic_class = Some(class.into());
        self
    }

    pub fn with_indication(mut self, indication: impl Into<String>) -> Self {
        self.indication = Some(indication.into());
        self
    }

    pub fn with_base_cost(mut self, cost: impl Into<RawCost>) -> Self {
        self.base_cost = Some(cost.into());
        self
    }

    /// Append an alternative slot. Slots beyond the fifth are ignored by extraction.
    pub fn with_alternative(mut self, name: impl Into<String>, cost: impl Into<RawCost>) -> Self {
        self.alternatives.push(AlternativeSlot::new(name, cost));
        self
    }

    pub fn with_insurance(mut self, drug: impl Into<String>, final_cost: impl Into<RawCost>) -> Self {
        self.insurance_drug = Some(drug.into());
        self.insurance_final_cost = Some(final_cost.into());
        self
    }

    /// Parsed base cost, `None` when absent or unusable.
    pub fn base_cost_value(&self) -> Option<f64> {
        self.base_cost
            .as_ref()
            .map(RawCost::value)
            .filter(|c| c.is_finite())
    }

    /// Parsed insurance final cost, `None` when absent or unusable.
    pub fn insurance_cost_value(&self) -> Option<f64> {
        self.insurance_final_cost
            .as_ref()
            .map(RawCost::value)
            .filter(|c| c.is_finite())
    }

    /// Lowercased name used for case-insensitive lookups.
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}
