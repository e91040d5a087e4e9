//! Exact cosine nearest-neighbor search.

use super::tfidf::SparseVector;
use super::{SimilarityError, SimilarityResult};
use crate::models::Neighbor;

/// Distances equal at this resolution are ties and fall back to row order.
const DISTANCE_RESOLUTION: f64 = 1e9;

fn distance_key(distance: f64) -> f64 {
    (distance * DISTANCE_RESOLUTION).round()
}

#[derive(Debug, Clone)]
enum Rows {
    Sparse(Vec<SparseVector>),
    Dense(Vec<Vec<f64>>),
}

/// Row vectors of the corpus, either raw TF-IDF or SVD-reduced.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    rows: Rows,
    norms: Vec<f64>,
    dimensions: usize,
}

impl VectorSpace {
    pub fn sparse(rows: Vec<SparseVector>, dimensions: usize) -> Self {
        let norms = rows.iter().map(SparseVector::norm).collect();
        Self {
            rows: Rows::Sparse(rows),
            norms,
            dimensions,
        }
    }

    pub fn dense(rows: Vec<Vec<f64>>, dimensions: usize) -> Self {
        let norms = rows
            .iter()
            .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
            .collect();
        Self {
            rows: Rows::Dense(rows),
            norms,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn is_reduced(&self) -> bool {
        matches!(self.rows, Rows::Dense(_))
    }

    fn dot(&self, i: usize, j: usize) -> f64 {
        match &self.rows {
            Rows::Sparse(rows) => rows[i].dot(&rows[j]),
            Rows::Dense(rows) => rows[i].iter().zip(&rows[j]).map(|(a, b)| a * b).sum(),
        }
    }

    /// Cosine similarity of two rows; 0.0 when either row is all zeros.
    pub fn cosine_similarity(&self, i: usize, j: usize) -> f64 {
        let denominator = self.norms[i] * self.norms[j];
        if denominator == 0.0 {
            0.0
        } else {
            self.dot(i, j) / denominator
        }
    }
}

/// Brute-force cosine k-NN over a [`VectorSpace`].
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    space: VectorSpace,
}

impl SimilarityIndex {
    pub fn build(space: VectorSpace) -> Self {
        Self { space }
    }

    pub fn len(&self) -> usize {
        self.space.len()
    }

    pub fn is_empty(&self) -> bool {
        self.space.is_empty()
    }

    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    /// The `k` rows closest to row `query`, excluding the row itself.
    ///
    /// Ordered by ascending cosine distance; distances equal up to floating-point
    /// noise keep row order.
    pub fn neighbors(&self, query: usize, k: usize) -> SimilarityResult<Vec<Neighbor>> {
        if query >= self.len() {
            return Err(SimilarityError::IndexOutOfRange {
                index: query,
                len: self.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = (0..self.len())
            .filter(|&index| index != query)
            .map(|index| Neighbor {
                index,
                distance: 1.0 - self.space.cosine_similarity(query, index),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            distance_key(a.distance)
                .total_cmp(&distance_key(b.distance))
                .then(a.index.cmp(&b.index))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_index(rows: Vec<Vec<f64>>) -> SimilarityIndex {
        let dims = rows.first().map_or(0, Vec::len);
        SimilarityIndex::build(VectorSpace::dense(rows, dims))
    }

    #[test]
    fn test_excludes_query_row() {
        let index = dense_index(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let neighbors = index.neighbors(0, 5).unwrap();

        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.index != 0));
        assert_eq!(neighbors[0].index, 1);
        assert!(neighbors[0].distance.abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let index = dense_index(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 2.0],
            vec![0.0, 3.0],
        ]);
        let order: Vec<_> = index.neighbors(0, 3).unwrap().iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_rounding_noise_is_a_tie() {
        let index = dense_index(vec![
            vec![1.0, 0.0],
            vec![0.6, 0.8 + 1e-15],
            vec![0.6, 0.8],
            vec![0.6, 0.8 - 1e-15],
            vec![0.0, 1.0],
        ]);
        let order: Vec<_> = index.neighbors(0, 2).unwrap().iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_truncates_to_k() {
        let index = dense_index(vec![vec![1.0, 0.0]; 10]);
        assert_eq!(index.neighbors(3, 6).unwrap().len(), 6);
        assert!(index.neighbors(3, 0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_vector_has_distance_one() {
        let rows = vec![
            SparseVector { indices: vec![0], values: vec![1.0] },
            SparseVector::default(),
        ];
        let index = SimilarityIndex::build(VectorSpace::sparse(rows, 1));
        let neighbors = index.neighbors(1, 1).unwrap();
        assert_eq!(neighbors[0].distance, 1.0);
    }

    #[test]
    fn test_out_of_range() {
        let index = dense_index(vec![vec![1.0]]);
        assert!(matches!(
            index.neighbors(4, 1),
            Err(SimilarityError::IndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_repeated_queries_are_identical() {
        let index = dense_index(vec![
            vec![0.3, 0.9, 0.1],
            vec![0.2, 0.8, 0.4],
            vec![0.9, 0.1, 0.0],
            vec![0.5, 0.5, 0.5],
        ]);
        assert_eq!(index.neighbors(2, 3).unwrap(), index.neighbors(2, 3).unwrap());
    }
}
