//! Corpus construction from drug attributes.

use sha2::{Digest, Sha256};

use crate::config::RecommenderConfig;
use crate::models::DrugRecord;

/// Similarity-search text for one drug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    text: String,
}

impl CorpusEntry {
    /// Wrap arbitrary text (mainly for tests and ad-hoc vectorizing).
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build the entry for a record: `name class indication`, missing fields empty.
    pub fn from_record(record: &DrugRecord) -> Self {
        Self {
            text: format!(
                "{} {} {}",
                record.name,
                record.therapeutic_class.as_deref().unwrap_or(""),
                record.indication.as_deref().unwrap_or("")
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Build one corpus entry per record, in record order.
pub fn build_corpus(records: &[DrugRecord]) -> Vec<CorpusEntry> {
    records.iter().map(CorpusEntry::from_record).collect()
}

/// Identity of a corpus plus the build settings, as hex SHA-256.
pub fn corpus_fingerprint(entries: &[CorpusEntry], config: &RecommenderConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.build_key().as_bytes());
    for entry in entries {
        hasher.update(b"\n");
        hasher.update(entry.as_str().as_bytes());
    }
    hex::encode(hasher.finalize())
}
