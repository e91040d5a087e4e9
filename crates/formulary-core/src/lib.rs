//! Formulary Core Library
//!
//! Cheapest therapeutic-substitute recommendation over a drug formulary.
//!
//! # Architecture
//!
//! ```text
//! CSV / SQLite → DrugRecords → Corpus ("name class use")
//!                                   │
//!                           TF-IDF → truncated SVD
//!                                   │
//!                         Similarity Index (cosine k-NN)
//!                                   │
//!              query ─────▶ Recommendation Aggregator
//!                                   │
//!                    own cheapest slot, else cheapest peer slot
//! ```
//!
//! The index is built once per catalog and shared read-only between queries.
//!
//! # Modules
//!
//! - [`models`]: Domain types (DrugRecord, Catalog, RecommendationResult)
//! - [`pricing`]: Cost parsing, alternative extraction, lookup and impact analysis
//! - [`similarity`]: Corpus, TF-IDF, SVD and cosine index
//! - [`recommender`]: Build-once index repository and aggregation
//! - [`dataset`]: CSV loading
//! - [`db`]: SQLite formulary store

pub mod config;
pub mod dataset;
pub mod db;
pub mod models;
pub mod pricing;
pub mod recommender;
pub mod similarity;

// Re-export commonly used types
pub use config::RecommenderConfig;
pub use db::Database;
pub use models::{
    AlternativeCandidate, AlternativeSlot, Catalog, DrugRecord, Neighbor, RawCost,
    RecommendationResult,
};
pub use pricing::impact::{ImpactMode, ImpactReport};
pub use pricing::lookup::FormularyLookup;
pub use pricing::parse_cost;
pub use recommender::{NameSuggestion, Recommender};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FormularyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for FormularyError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::InvalidInput(msg) => FormularyError::InvalidInput(msg),
            other => FormularyError::DatabaseError(other.to_string()),
        }
    }
}

impl From<dataset::DatasetError> for FormularyError {
    fn from(e: dataset::DatasetError) -> Self {
        FormularyError::DatasetError(e.to_string())
    }
}

impl From<recommender::RecommendError> for FormularyError {
    fn from(e: recommender::RecommendError) -> Self {
        FormularyError::IndexError(e.to_string())
    }
}

impl From<serde_json::Error> for FormularyError {
    fn from(e: serde_json::Error) -> Self {
        FormularyError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for FormularyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        FormularyError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn core_from_database(db: Database) -> Result<Arc<FormularyCore>, FormularyError> {
    let records = db.list_drugs()?;
    Ok(Arc::new(FormularyCore {
        recommender: Arc::new(Recommender::new(records, RecommenderConfig::default())),
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Open or create a formulary database at the given path.
///
/// The similarity index is built on the first recommendation.
#[uniffi::export]
pub fn open_formulary(db_path: String) -> Result<Arc<FormularyCore>, FormularyError> {
    core_from_database(Database::open(&db_path)?)
}

/// Create an empty in-memory formulary (for testing).
#[uniffi::export]
pub fn open_formulary_in_memory() -> Result<Arc<FormularyCore>, FormularyError> {
    core_from_database(Database::open_in_memory()?)
}

/// Load a formulary CSV into an in-memory store and build the index.
#[uniffi::export]
pub fn load_formulary_csv(csv_path: String) -> Result<Arc<FormularyCore>, FormularyError> {
    let records = dataset::load_csv(&csv_path)?;
    let mut db = Database::open_in_memory()?;
    db.import_drugs(&records)?;

    let recommender = Recommender::build(records, RecommenderConfig::default())?;
    Ok(Arc::new(FormularyCore {
        recommender: Arc::new(recommender),
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe formulary wrapper for FFI.
#[derive(uniffi::Object)]
pub struct FormularyCore {
    recommender: Arc<Recommender>,
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl FormularyCore {
    // =========================================================================
    // Recommendation
    // =========================================================================

    /// Recommend the cheapest substitute for a drug.
    pub fn recommend(&self, name: String) -> Result<FfiRecommendation, FormularyError> {
        let result = self.recommender.recommend(&name)?;
        Ok(FfiRecommendation::from_result(name, result))
    }

    /// Known drug names close to a query, best first.
    pub fn suggest(&self, query: String, limit: u32) -> Result<Vec<String>, FormularyError> {
        let suggestions = self.recommender.suggest(&query, limit as usize)?;
        Ok(suggestions.into_iter().map(|s| s.name).collect())
    }

    /// Rebuild the catalog from the database. Returns the number of drugs.
    pub fn reload_from_database(&self) -> Result<u32, FormularyError> {
        let records = {
            let db = self.db.lock()?;
            db.list_drugs()?
        };
        let count = records.len() as u32;
        self.recommender.reload(records)?;
        Ok(count)
    }

    // =========================================================================
    // Formulary Store
    // =========================================================================

    /// Real-time cost lookup for one drug.
    pub fn lookup(&self, name: String) -> Result<FfiLookup, FormularyError> {
        let db = self.db.lock()?;
        Ok(db.lookup(&name)?.into())
    }

    /// Insert a new drug. Returns its id.
    ///
    /// Recommendations see the drug after [`Self::reload_from_database`].
    pub fn insert_drug(&self, record: FfiDrugRecord) -> Result<String, FormularyError> {
        let db = self.db.lock()?;
        Ok(db.insert_drug(&record.into())?)
    }

    /// All stored drugs in insertion order.
    pub fn list_drugs(&self) -> Result<Vec<FfiDrugRecord>, FormularyError> {
        let db = self.db.lock()?;
        Ok(db.list_drugs()?.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Impact Analysis
    // =========================================================================

    /// Impact analysis over selected drugs as JSON.
    pub fn impact_json(&self, names: Vec<String>, use_insurance: bool) -> Result<String, FormularyError> {
        Ok(self.impact(&names, use_insurance)?.to_json()?)
    }

    /// Impact analysis over selected drugs as CSV.
    pub fn impact_csv(&self, names: Vec<String>, use_insurance: bool) -> Result<String, FormularyError> {
        Ok(self.impact(&names, use_insurance)?.to_csv())
    }
}

impl FormularyCore {
    fn impact(&self, names: &[String], use_insurance: bool) -> Result<ImpactReport, FormularyError> {
        let mode = if use_insurance {
            ImpactMode::Insurance
        } else {
            ImpactMode::Alternatives
        };
        let catalog = self.recommender.catalog()?;
        Ok(pricing::impact::analyze(&catalog, names, mode))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn finite(cost: Option<&RawCost>) -> Option<f64> {
    cost.map(RawCost::value).filter(|c| c.is_finite())
}

/// FFI-safe alternative slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAlternative {
    pub name: Option<String>,
    pub cost: Option<f64>,
}

/// FFI-safe drug record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrugRecord {
    pub name: String,
    pub therapeutic_class: Option<String>,
    pub indication: Option<String>,
    pub drug_cost: Option<f64>,
    pub alternatives: Vec<FfiAlternative>,
    pub insurance_drug: Option<String>,
    pub insurance_final_cost: Option<f64>,
}

impl From<DrugRecord> for FfiDrugRecord {
    fn from(record: DrugRecord) -> Self {
        Self {
            drug_cost: finite(record.base_cost.as_ref()),
            insurance_final_cost: finite(record.insurance_final_cost.as_ref()),
            alternatives: record
                .alternatives
                .iter()
                .map(|slot| FfiAlternative {
                    name: slot.name.clone(),
                    cost: finite(slot.cost.as_ref()),
                })
                .collect(),
            name: record.name,
            therapeutic_class: record.therapeutic_class,
            indication: record.indication,
            insurance_drug: record.insurance_drug,
        }
    }
}

impl From<FfiDrugRecord> for DrugRecord {
    fn from(record: FfiDrugRecord) -> Self {
        DrugRecord {
            name: record.name,
            therapeutic_class: models::normalize_text(record.therapeutic_class.as_deref()),
            indication: models::normalize_text(record.indication.as_deref()),
            base_cost: record.drug_cost.map(RawCost::Number),
            alternatives: record
                .alternatives
                .into_iter()
                .map(|alt| AlternativeSlot {
                    name: models::normalize_text(alt.name.as_deref()),
                    cost: alt.cost.map(RawCost::Number),
                })
                .collect(),
            insurance_drug: models::normalize_text(record.insurance_drug.as_deref()),
            insurance_final_cost: record.insurance_final_cost.map(RawCost::Number),
        }
    }
}

/// Outcome kind of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRecommendationStatus {
    Found,
    NotFound,
    NoAlternatives,
}

/// FFI-safe recommendation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecommendation {
    pub status: FfiRecommendationStatus,
    pub queried_name: String,
    pub substitute_name: Option<String>,
    pub substitute_cost: Option<f64>,
    pub source_drug_name: Option<String>,
    pub source_drug_cost: Option<f64>,
    /// Other peer-derived substitutes, cheapest first
    pub other_substitutes: Vec<String>,
}

impl FfiRecommendation {
    fn from_result(queried_name: String, result: RecommendationResult) -> Self {
        let empty = |status| Self {
            status,
            queried_name: queried_name.clone(),
            substitute_name: None,
            substitute_cost: None,
            source_drug_name: None,
            source_drug_cost: None,
            other_substitutes: Vec::new(),
        };

        match result {
            RecommendationResult::Found { best, others } => Self {
                status: FfiRecommendationStatus::Found,
                queried_name: queried_name.clone(),
                substitute_name: Some(best.substitute_name),
                substitute_cost: Some(best.cost),
                source_drug_name: Some(best.source_drug_name),
                source_drug_cost: best.source_drug_cost,
                other_substitutes: others.into_iter().map(|c| c.substitute_name).collect(),
            },
            RecommendationResult::NotFound { .. } => empty(FfiRecommendationStatus::NotFound),
            RecommendationResult::NoAlternatives { .. } => empty(FfiRecommendationStatus::NoAlternatives),
        }
    }
}

/// FFI-safe real-time lookup.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLookup {
    pub exists: bool,
    pub medicine: String,
    pub drug_cost: Option<f64>,
    pub cheapest_option: String,
    pub cheapest_cost: Option<f64>,
    pub saving_percent: f64,
    pub insurance_drug: Option<String>,
    pub insurance_final_cost: Option<f64>,
    pub effective_cost: Option<f64>,
}

impl From<FormularyLookup> for FfiLookup {
    fn from(info: FormularyLookup) -> Self {
        Self {
            exists: info.exists,
            medicine: info.medicine,
            drug_cost: info.drug_cost,
            cheapest_option: info.cheapest_option,
            cheapest_cost: info.cheapest_cost,
            saving_percent: info.saving_percent,
            insurance_drug: info.insurance_drug,
            insurance_final_cost: info.insurance_final_cost,
            effective_cost: info.effective_cost,
        }
    }
}
