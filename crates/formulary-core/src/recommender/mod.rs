//! Cheapest-substitute recommender.
//!
//! Pipeline: Corpus → TF-IDF (+ SVD) → Similarity Index → Aggregation
//!
//! The index is built once per catalog and shared read-only between queries.
//! [`Recommender::ensure_built`] serializes construction, so concurrent
//! callers never build twice and a failed build leaves nothing cached.

mod aggregator;
mod suggest;

pub use aggregator::*;
pub use suggest::*;

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::config::RecommenderConfig;
use crate::models::{Catalog, DrugRecord, RecommendationResult};
use crate::similarity::{build_corpus, build_vector_space, corpus_fingerprint, SimilarityError, SimilarityIndex};

/// Recommender errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("Index unavailable: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Recommender lock poisoned: {0}")]
    Poisoned(String),
}

impl<T> From<PoisonError<T>> for RecommendError {
    fn from(e: PoisonError<T>) -> Self {
        RecommendError::Poisoned(e.to_string())
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;

/// An immutable catalog together with its similarity index.
#[derive(Debug)]
pub struct BuiltIndex {
    catalog: Arc<Catalog>,
    index: SimilarityIndex,
    fingerprint: String,
}

impl BuiltIndex {
    /// Vectorize and index a catalog.
    pub fn build(catalog: Arc<Catalog>, config: &RecommenderConfig) -> RecommendResult<Self> {
        let corpus = build_corpus(catalog.records());
        let fingerprint = corpus_fingerprint(&corpus, config);
        let space = build_vector_space(&corpus, config)?;

        tracing::info!(
            drugs = catalog.len(),
            dimensions = space.dimensions(),
            reduced = space.is_reduced(),
            fingerprint = %fingerprint,
            "similarity index built"
        );

        Ok(Self {
            catalog,
            index: SimilarityIndex::build(space),
            fingerprint,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Identity of the corpus and build settings this index was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

struct State {
    catalog: Arc<Catalog>,
    fingerprint: String,
    built: Option<Arc<BuiltIndex>>,
}

impl State {
    fn new(catalog: Catalog, config: &RecommenderConfig) -> Self {
        let fingerprint = corpus_fingerprint(&build_corpus(catalog.records()), config);
        Self {
            catalog: Arc::new(catalog),
            fingerprint,
            built: None,
        }
    }
}

/// Repository owning the catalog and its lazily built index.
pub struct Recommender {
    config: RecommenderConfig,
    state: Mutex<State>,
}

impl Recommender {
    /// Create a recommender; the index is built on first use.
    pub fn new(records: Vec<DrugRecord>, config: RecommenderConfig) -> Self {
        let state = State::new(Catalog::new(records), &config);
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Create a recommender and build its index immediately.
    pub fn build(records: Vec<DrugRecord>, config: RecommenderConfig) -> RecommendResult<Self> {
        let recommender = Self::new(records, config);
        recommender.ensure_built()?;
        Ok(recommender)
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Return the built index, building it if needed.
    pub fn ensure_built(&self) -> RecommendResult<Arc<BuiltIndex>> {
        let mut state = self.state.lock()?;

        if let Some(built) = &state.built {
            if built.fingerprint() == state.fingerprint {
                return Ok(Arc::clone(built));
            }
        }

        match BuiltIndex::build(Arc::clone(&state.catalog), &self.config) {
            Ok(built) => {
                let built = Arc::new(built);
                state.built = Some(Arc::clone(&built));
                Ok(built)
            }
            Err(e) => {
                tracing::warn!(error = %e, drugs = state.catalog.len(), "similarity index build failed");
                state.built = None;
                Err(e)
            }
        }
    }

    /// Recommend the cheapest substitute for a drug name.
    pub fn recommend(&self, name: &str) -> RecommendResult<RecommendationResult> {
        let built = self.ensure_built()?;
        aggregator::recommend(&built, name, self.config.neighborhood_size)
    }

    /// Recommend for several names against the same index.
    pub fn recommend_all<S: AsRef<str>>(&self, names: &[S]) -> RecommendResult<Vec<RecommendationResult>> {
        let built = self.ensure_built()?;
        names
            .iter()
            .map(|name| aggregator::recommend(&built, name.as_ref(), self.config.neighborhood_size))
            .collect()
    }

    /// Known drug names close to `query`. Does not need the index.
    pub fn suggest(&self, query: &str, limit: usize) -> RecommendResult<Vec<NameSuggestion>> {
        let catalog = self.catalog()?;
        Ok(suggest_names(&catalog, query, limit))
    }

    /// Replace the catalog. The cached index is dropped and rebuilt on next use.
    pub fn reload(&self, records: Vec<DrugRecord>) -> RecommendResult<()> {
        let fresh = State::new(Catalog::new(records), &self.config);
        let mut state = self.state.lock()?;
        tracing::info!(drugs = fresh.catalog.len(), "catalog reloaded");
        *state = fresh;
        Ok(())
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> RecommendResult<Arc<Catalog>> {
        Ok(Arc::clone(&self.state.lock()?.catalog))
    }
}
