//! TF-IDF vectorization of the drug corpus.

use std::collections::{BTreeMap, BTreeSet};

use super::corpus::CorpusEntry;
use super::stopwords::is_stop_word;
use super::{SimilarityError, SimilarityResult};

/// Split text into lowercase word tokens.
///
/// Word characters are alphanumerics and `_`; tokens shorter than two
/// characters and English stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Sparse row with strictly increasing feature indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut sum) = (0, 0, 0.0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Dot product with a dense vector of at least `max index + 1` entries.
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&i, &v)| v * dense[i])
            .sum()
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            self.values.iter_mut().for_each(|v| *v /= norm);
        }
    }
}

/// TF-IDF vectorizer with a sorted vocabulary and smoothed IDF.
///
/// Term weights are `count * idf` with `idf = ln((1 + n) / (1 + df)) + 1`,
/// and each row is L2-normalized.
#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn vocabulary and IDF weights.
    pub fn fit(&mut self, entries: &[CorpusEntry]) -> SimilarityResult<()> {
        if entries.is_empty() {
            return Err(SimilarityError::EmptyCorpus);
        }

        let documents: Vec<BTreeSet<String>> = entries
            .iter()
            .map(|entry| tokenize(entry.as_str()).into_iter().collect())
            .collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for terms in &documents {
            for term in terms {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let n = entries.len() as f64;
        self.vocabulary = document_frequency
            .keys()
            .enumerate()
            .map(|(index, term)| (term.to_string(), index))
            .collect();
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        tracing::debug!(
            documents = entries.len(),
            vocabulary = self.idf.len(),
            "tf-idf vocabulary fitted"
        );
        Ok(())
    }

    /// Weight entries with the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, entries: &[CorpusEntry]) -> Vec<SparseVector> {
        entries
            .iter()
            .map(|entry| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in tokenize(entry.as_str()) {
                    if let Some(&index) = self.vocabulary.get(&token) {
                        *counts.entry(index).or_insert(0.0) += 1.0;
                    }
                }
                let mut row = SparseVector {
                    indices: counts.keys().copied().collect(),
                    values: counts
                        .iter()
                        .map(|(&index, &count)| count * self.idf[index])
                        .collect(),
                };
                row.normalize();
                row
            })
            .collect()
    }

    pub fn fit_transform(&mut self, entries: &[CorpusEntry]) -> SimilarityResult<Vec<SparseVector>> {
        self.fit(entries)?;
        Ok(self.transform(entries))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Feature index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(texts: &[&str]) -> Vec<CorpusEntry> {
        texts.iter().map(|t| CorpusEntry::new(*t)).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Aspirin Analgesic, pain-relief for the HEAD a"),
            vec!["aspirin", "analgesic", "pain", "relief", "head"]
        );
        assert_eq!(tokenize("b12_complex x"), vec!["b12_complex"]);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&entries(&["zinc oxide", "aspirin"])).unwrap();

        assert_eq!(vectorizer.vocabulary_size(), 3);
        assert_eq!(vectorizer.term_index("aspirin"), Some(0));
        assert_eq!(vectorizer.term_index("oxide"), Some(1));
        assert_eq!(vectorizer.term_index("zinc"), Some(2));
    }

    #[test]
    fn test_rows_are_unit_length() {
        let mut vectorizer = TfIdfVectorizer::new();
        let rows = vectorizer
            .fit_transform(&entries(&["aspirin analgesic pain", "ibuprofen analgesic pain fever"]))
            .unwrap();

        for row in &rows {
            assert!((row.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let mut vectorizer = TfIdfVectorizer::new();
        let rows = vectorizer
            .fit_transform(&entries(&["common rare", "common", "common"]))
            .unwrap();

        let common = vectorizer.term_index("common").unwrap();
        let rare = vectorizer.term_index("rare").unwrap();
        let weight = |index| {
            let pos = rows[0].indices.iter().position(|&i| i == index).unwrap();
            rows[0].values[pos]
        };
        assert!(weight(rare) > weight(common));
    }

    #[test]
    fn test_empty_corpus() {
        let mut vectorizer = TfIdfVectorizer::new();
        assert!(matches!(vectorizer.fit(&[]), Err(SimilarityError::EmptyCorpus)));
    }

    #[test]
    fn test_only_stop_words() {
        let mut vectorizer = TfIdfVectorizer::new();
        assert!(matches!(
            vectorizer.fit(&entries(&["the and", "a"])),
            Err(SimilarityError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_document_without_terms_is_zero() {
        let mut vectorizer = TfIdfVectorizer::new();
        let rows = vectorizer.fit_transform(&entries(&["aspirin", "the"])).unwrap();
        assert_eq!(rows[1].nnz(), 0);
        assert_eq!(rows[1].norm(), 0.0);
    }

    #[test]
    fn test_sparse_dot() {
        let a = SparseVector { indices: vec![0, 2, 5], values: vec![1.0, 2.0, 3.0] };
        let b = SparseVector { indices: vec![2, 3, 5], values: vec![4.0, 9.0, 1.0] };
        assert_eq!(a.dot(&b), 11.0);
        assert_eq!(a.dot_dense(&[1.0, 0.0, 1.0, 0.0, 0.0, 1.0]), 6.0);
    }
}
