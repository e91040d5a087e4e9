//! Text similarity over drug attributes.
//!
//! - [`corpus`]: per-drug text and corpus fingerprint
//! - [`tfidf`]: tokenizer and TF-IDF vectorizer
//! - [`svd`]: seeded truncated SVD projection
//! - [`index`]: cosine nearest-neighbor search

pub mod corpus;
pub mod index;
mod stopwords;
pub mod svd;
pub mod tfidf;

pub use corpus::{build_corpus, corpus_fingerprint, CorpusEntry};
pub use index::{SimilarityIndex, VectorSpace};
pub use stopwords::is_stop_word;
pub use svd::TruncatedSvd;
pub use tfidf::{tokenize, SparseVector, TfIdfVectorizer};

use thiserror::Error;

use crate::config::RecommenderConfig;

/// Similarity index construction and query errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("Corpus is empty")]
    EmptyCorpus,

    #[error("Corpus has no indexable terms")]
    EmptyVocabulary,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Row {index} out of range for index of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type SimilarityResult<T> = Result<T, SimilarityError>;

/// Vectorize a corpus: TF-IDF, then SVD when it actually reduces dimensionality.
pub fn build_vector_space(entries: &[CorpusEntry], config: &RecommenderConfig) -> SimilarityResult<VectorSpace> {
    let mut vectorizer = TfIdfVectorizer::new();
    let rows = vectorizer.fit_transform(entries)?;
    let vocabulary = vectorizer.vocabulary_size();

    let svd = TruncatedSvd::from_config(config);
    let components = svd.effective_components(rows.len(), vocabulary);

    if config.use_svd && components < vocabulary {
        let projection = svd.fit_transform(&rows, vocabulary)?;
        tracing::info!(
            documents = rows.len(),
            vocabulary,
            components = projection.dimensions(),
            "vector space built with svd projection"
        );
        let dimensions = projection.dimensions();
        Ok(VectorSpace::dense(projection.rows, dimensions))
    } else {
        tracing::info!(documents = rows.len(), vocabulary, "vector space built from raw tf-idf");
        Ok(VectorSpace::sparse(rows, vocabulary))
    }
}
