//! CSV loading of the drug dataset.
//!
//! Headers are matched case-insensitively with spaces and underscores
//! ignored, so `Alternative 1`, `Alternative_1` and `alternative1` all name
//! the first slot. Only the medicine name column is required; blank cells and
//! null markers become `None` here so nothing downstream compares against
//! marker strings.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::models::{normalize_text, AlternativeSlot, DrugRecord, RawCost, ALTERNATIVE_SLOTS};

/// Dataset loading errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

const NAME_HEADERS: &[&str] = &["medicine", "name"];
const CLASS_HEADERS: &[&str] = &["therapeuticclass", "class"];
const INDICATION_HEADERS: &[&str] = &["use", "indication"];
const BASE_COST_HEADERS: &[&str] = &["drugcost"];
const INSURANCE_DRUG_HEADERS: &[&str] = &["insurancedrug"];
const INSURANCE_COST_HEADERS: &[&str] = &["insurancedrugfinalcost", "insurancefinalcost"];

fn canonical_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn position(canonical: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| canonical.iter().position(|h| h == alias))
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    name: usize,
    class: Option<usize>,
    indication: Option<usize>,
    base_cost: Option<usize>,
    alternatives: Vec<(Option<usize>, Option<usize>)>,
    insurance_drug: Option<usize>,
    insurance_cost: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> DatasetResult<Self> {
        let canonical: Vec<String> = headers.iter().map(canonical_header).collect();
        let find = |aliases: &[&str]| position(&canonical, aliases);

        let name = find(NAME_HEADERS).ok_or_else(|| DatasetError::MissingColumn("Medicine".into()))?;
        let alternatives = (1..=ALTERNATIVE_SLOTS)
            .map(|slot| {
                let alt = format!("alternative{slot}");
                let cost = format!("cost{slot}");
                (position(&canonical, &[alt.as_str()]), position(&canonical, &[cost.as_str()]))
            })
            .collect();

        Ok(Self {
            name,
            class: find(CLASS_HEADERS),
            indication: find(INDICATION_HEADERS),
            base_cost: find(BASE_COST_HEADERS),
            alternatives,
            insurance_drug: find(INSURANCE_DRUG_HEADERS),
            insurance_cost: find(INSURANCE_COST_HEADERS),
        })
    }
}

fn text(row: &StringRecord, column: Option<usize>) -> Option<String> {
    normalize_text(column.and_then(|c| row.get(c)))
}

fn cost(row: &StringRecord, column: Option<usize>) -> Option<RawCost> {
    text(row, column).map(RawCost::Text)
}

fn parse_row(row: &StringRecord, columns: &Columns) -> Option<DrugRecord> {
    let name = text(row, Some(columns.name))?;

    let mut alternatives: Vec<AlternativeSlot> = columns
        .alternatives
        .iter()
        .map(|&(alt, cost_col)| AlternativeSlot {
            name: text(row, alt),
            cost: cost(row, cost_col),
        })
        .collect();
    while alternatives.last().is_some_and(|slot| *slot == AlternativeSlot::default()) {
        alternatives.pop();
    }

    Some(DrugRecord {
        name,
        therapeutic_class: text(row, columns.class),
        indication: text(row, columns.indication),
        base_cost: cost(row, columns.base_cost),
        alternatives,
        insurance_drug: text(row, columns.insurance_drug),
        insurance_final_cost: cost(row, columns.insurance_cost),
    })
}

/// Read drug records from CSV data. Rows without a usable name are skipped.
pub fn from_reader<R: Read>(reader: R) -> DatasetResult<Vec<DrugRecord>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(reader.headers()?)?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        match parse_row(&row, &columns) {
            Some(record) => records.push(record),
            None => tracing::warn!(row = line + 1, "skipping row without medicine name"),
        }
    }

    Ok(records)
}

/// Load drug records from a CSV file.
pub fn load_csv<P: AsRef<Path>>(path: P) -> DatasetResult<Vec<DrugRecord>> {
    let path = path.as_ref();
    let records = from_reader(File::open(path)?)?;
    tracing::info!(path = %path.display(), drugs = records.len(), "dataset loaded");
    Ok(records)
}
