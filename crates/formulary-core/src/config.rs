//! Recommender configuration.

use serde::{Deserialize, Serialize};

/// Settings for index construction and peer lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Number of similar drugs consulted per query
    pub neighborhood_size: usize,
    /// Project TF-IDF vectors with truncated SVD
    pub use_svd: bool,
    /// Target dimensionality of the SVD projection
    pub svd_components: usize,
    /// Extra random directions sampled by the range finder
    pub svd_oversamples: usize,
    /// Power iterations applied to the sampled range
    pub svd_power_iterations: usize,
    /// Seed of the random projection
    pub random_seed: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            neighborhood_size: 6,
            use_svd: true,
            svd_components: 200,
            svd_oversamples: 10,
            svd_power_iterations: 4,
            random_seed: 42,
        }
    }
}

impl RecommenderConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Disable the SVD projection and search raw TF-IDF vectors.
    pub fn without_svd(mut self) -> Self {
        self.use_svd = false;
        self
    }

    pub fn with_svd_components(mut self, components: usize) -> Self {
        self.use_svd = true;
        self.svd_components = components;
        self
    }

    pub fn with_neighborhood_size(mut self, k: usize) -> Self {
        self.neighborhood_size = k;
        self
    }

    /// Fields that change the built index, for fingerprinting.
    pub(crate) fn build_key(&self) -> String {
        format!(
            "svd={};components={};oversamples={};power={};seed={}",
            self.use_svd,
            self.svd_components,
            self.svd_oversamples,
            self.svd_power_iterations,
            self.random_seed
        )
    }
}
