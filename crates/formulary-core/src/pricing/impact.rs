//! Formulary impact analysis.
//!
//! Totals the cost of a selection of drugs and what it would cost either
//! with insurance applied or with each drug switched to its cheapest listed
//! alternative.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::cheapest_alternative;
use crate::models::Catalog;

/// How the final cost of each selected drug is determined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImpactMode {
    /// Use each drug's insurance final cost
    Insurance,
    /// Switch to the cheapest listed alternative when it is cheaper
    Alternatives,
}

/// One line of the impact report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactLine {
    /// Selected drug
    pub medicine: String,
    /// Cost of the selected drug
    pub base_cost: Option<f64>,
    /// Insurance drug or cheaper alternative
    pub substitute: Option<String>,
    /// Cost after insurance or substitution
    pub final_cost: Option<f64>,
}

/// Impact report over a selection of drugs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Report timestamp
    pub generated_at: String,
    pub mode: ImpactMode,
    pub lines: Vec<ImpactLine>,
    /// Sum of base costs of every selected drug
    pub total_base_cost: f64,
    /// Sum of final costs over the report lines
    pub total_final_cost: f64,
    pub savings: f64,
}

/// Analyze a selection of drugs by exact name.
///
/// Names match case-sensitively, first row wins. Unknown names are
/// skipped; repeated names are counted once. In
/// [`ImpactMode::Alternatives`] only drugs with a strictly cheaper
/// alternative produce a line.
pub fn analyze<S: AsRef<str>>(catalog: &Catalog, selection: &[S], mode: ImpactMode) -> ImpactReport {
    let records = catalog.records();
    let mut seen = HashSet::new();
    let selected: Vec<_> = selection
        .iter()
        .filter_map(|name| records.iter().position(|r| r.name == name.as_ref()))
        .filter(|index| seen.insert(*index))
        .map(|index| &records[index])
        .collect();

    let total_base_cost: f64 = selected.iter().filter_map(|r| r.base_cost_value()).sum();

    let lines: Vec<ImpactLine> = match mode {
        ImpactMode::Insurance => selected
            .iter()
            .map(|record| ImpactLine {
                medicine: record.name.clone(),
                base_cost: record.base_cost_value(),
                substitute: record.insurance_drug.clone(),
                final_cost: record.insurance_cost_value(),
            })
            .collect(),
        ImpactMode::Alternatives => selected
            .iter()
            .filter_map(|record| {
                let base = record.base_cost_value()?;
                let cheapest = cheapest_alternative(record)?;
                (cheapest.cost < base).then(|| ImpactLine {
                    medicine: record.name.clone(),
                    base_cost: Some(base),
                    substitute: Some(cheapest.substitute_name),
                    final_cost: Some(cheapest.cost),
                })
            })
            .collect(),
    };

    let total_final_cost: f64 = lines.iter().filter_map(|l| l.final_cost).sum();

    tracing::debug!(
        selected = selected.len(),
        lines = lines.len(),
        ?mode,
        "formulary impact analyzed"
    );

    ImpactReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        mode,
        lines,
        total_base_cost,
        total_final_cost,
        savings: total_base_cost - total_final_cost,
    }
}

impl ImpactReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("medicine,base_cost,substitute,final_cost\n");

        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                escape_csv(&line.medicine),
                format_cost(line.base_cost),
                escape_csv(line.substitute.as_deref().unwrap_or("")),
                format_cost(line.final_cost),
            ));
        }

        csv
    }
}

fn format_cost(cost: Option<f64>) -> String {
    cost.map(|c| format!("{:.2}", c)).unwrap_or_default()
}

/// Escape a value for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrugRecord;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            DrugRecord::new("Lipitor")
                .with_base_cost(40.0)
                .with_alternative("Atorvastatin", 10.0)
                .with_insurance("Lipitor (covered)", 15.0),
            DrugRecord::new("Norvasc")
                .with_base_cost(20.0)
                .with_alternative("Amlodipine", 25.0)
                .with_insurance("Amlodipine", 5.0),
            DrugRecord::new("Advil, Extra")
                .with_base_cost(8.0)
                .with_alternative("Ibuprofen", 2.0),
        ])
    }

    #[test]
    fn test_alternatives_mode() {
        let report = analyze(&catalog(), &["Lipitor", "Norvasc"], ImpactMode::Alternatives);

        // Norvasc's only alternative is more expensive
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].substitute.as_deref(), Some("Atorvastatin"));
        assert_eq!(report.total_base_cost, 60.0);
        assert_eq!(report.total_final_cost, 10.0);
        assert_eq!(report.savings, 50.0);
    }

    #[test]
    fn test_insurance_mode() {
        let report = analyze(&catalog(), &["Lipitor", "Norvasc"], ImpactMode::Insurance);

        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.total_final_cost, 20.0);
        assert_eq!(report.savings, 40.0);
    }

    #[test]
    fn test_unknown_and_repeated_names() {
        let report = analyze(
            &catalog(),
            &["Lipitor", "Lipitor", "Unknown"],
            ImpactMode::Insurance,
        );
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.total_base_cost, 40.0);
    }

    #[test]
    fn test_selection_is_case_sensitive() {
        let report = analyze(&catalog(), &["lipitor", "NORVASC"], ImpactMode::Insurance);
        assert!(report.lines.is_empty());
        assert_eq!(report.total_base_cost, 0.0);

        let report = analyze(&catalog(), &["lipitor", "Norvasc"], ImpactMode::Insurance);
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].medicine, "Norvasc");
    }

    #[test]
    fn test_csv_export_escapes() {
        let report = analyze(&catalog(), &["Advil, Extra"], ImpactMode::Alternatives);
        let csv = report.to_csv();

        assert!(csv.starts_with("medicine,base_cost,substitute,final_cost\n"));
        assert!(csv.contains("\"Advil, Extra\",8.00,Ibuprofen,2.00"));
    }

    #[test]
    fn test_json_export() {
        let report = analyze(&catalog(), &["Lipitor"], ImpactMode::Alternatives);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["mode"], "alternatives");
        assert_eq!(json["lines"][0]["medicine"], "Lipitor");
    }
}
