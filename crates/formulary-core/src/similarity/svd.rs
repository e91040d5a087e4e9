//! Seeded randomized truncated SVD over sparse TF-IDF rows.
//!
//! The range of `X` is sampled with a uniform random test matrix, refined
//! with power iterations, and the small projected problem is solved with a
//! cyclic Jacobi eigendecomposition. Output rows are `U * Sigma`, which
//! preserves the row geometry cosine search relies on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tfidf::SparseVector;
use super::{SimilarityError, SimilarityResult};
use crate::config::RecommenderConfig;

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-24;
const RANK_TOLERANCE: f64 = 1e-10;

/// Dense projection of the input rows.
#[derive(Debug, Clone)]
pub struct SvdProjection {
    /// One reduced row per input row
    pub rows: Vec<Vec<f64>>,
    /// Singular values, descending
    pub singular_values: Vec<f64>,
}

impl SvdProjection {
    pub fn dimensions(&self) -> usize {
        self.singular_values.len()
    }
}

/// Truncated SVD settings.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    components: usize,
    oversamples: usize,
    power_iterations: usize,
    seed: u64,
}

impl TruncatedSvd {
    pub fn new(components: usize) -> Self {
        Self {
            components,
            oversamples: 10,
            power_iterations: 4,
            seed: 42,
        }
    }

    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self::new(config.svd_components)
            .with_oversamples(config.svd_oversamples)
            .with_power_iterations(config.svd_power_iterations)
            .with_seed(config.random_seed)
    }

    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.oversamples = oversamples;
        self
    }

    pub fn with_power_iterations(mut self, iterations: usize) -> Self {
        self.power_iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Target rank after clamping to the matrix shape.
    pub fn effective_components(&self, n_rows: usize, n_features: usize) -> usize {
        self.components.max(1).min(n_rows).min(n_features)
    }

    /// Project `rows` (an `n x n_features` sparse matrix) onto its top components.
    pub fn fit_transform(&self, rows: &[SparseVector], n_features: usize) -> SimilarityResult<SvdProjection> {
        let n = rows.len();
        if n == 0 || n_features == 0 {
            return Err(SimilarityError::EmptyCorpus);
        }
        if let Some(bad) = rows.iter().flat_map(|r| r.indices.iter()).find(|&&i| i >= n_features) {
            return Err(SimilarityError::DimensionMismatch {
                expected: n_features,
                actual: bad + 1,
            });
        }

        let rank = self.effective_components(n, n_features);
        let sample = (rank + self.oversamples).min(n).min(n_features);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let omega: Vec<Vec<f64>> = (0..sample)
            .map(|_| (0..n_features).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect();

        let mut q = multiply(rows, &omega);
        orthonormalize(&mut q);
        for _ in 0..self.power_iterations {
            let mut z = multiply_transpose(rows, &q, n_features);
            orthonormalize(&mut z);
            q = multiply(rows, &z);
            orthonormalize(&mut q);
        }

        // B = Q^T X; its rows are the columns of X^T Q
        let b = multiply_transpose(rows, &q, n_features);
        let mut gram: Vec<Vec<f64>> = (0..sample)
            .map(|i| (0..sample).map(|j| dot(&b[i], &b[j])).collect())
            .collect();
        let eigenvectors = jacobi_eigen(&mut gram);

        let mut order: Vec<usize> = (0..sample).collect();
        order.sort_by(|&x, &y| gram[y][y].total_cmp(&gram[x][x]).then(x.cmp(&y)));
        order.truncate(rank);

        let singular_values: Vec<f64> = order.iter().map(|&j| gram[j][j].max(0.0).sqrt()).collect();

        let projected = (0..n)
            .map(|i| {
                order
                    .iter()
                    .zip(&singular_values)
                    .map(|(&j, sigma)| {
                        let u: f64 = (0..sample).map(|c| q[c][i] * eigenvectors[c][j]).sum();
                        u * sigma
                    })
                    .collect()
            })
            .collect();

        tracing::debug!(rows = n, features = n_features, components = rank, "truncated svd fitted");

        Ok(SvdProjection {
            rows: projected,
            singular_values,
        })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `X * M` where `M` is given as columns of length `n_features`.
/// Returns columns of length `rows.len()`.
fn multiply(rows: &[SparseVector], columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|column| rows.iter().map(|row| row.dot_dense(column)).collect())
        .collect()
}

/// `X^T * M` where `M` is given as columns of length `rows.len()`.
/// Returns columns of length `n_features`.
fn multiply_transpose(rows: &[SparseVector], columns: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|column| {
            let mut out = vec![0.0; n_features];
            for (row, weight) in rows.iter().zip(column) {
                for (&k, &v) in row.indices.iter().zip(&row.values) {
                    out[k] += v * weight;
                }
            }
            out
        })
        .collect()
}

/// Modified Gram-Schmidt with one reorthogonalization pass.
///
/// Columns that vanish relative to their original length are zeroed.
fn orthonormalize(columns: &mut [Vec<f64>]) {
    for j in 0..columns.len() {
        let original = dot(&columns[j], &columns[j]).sqrt();
        let (done, rest) = columns.split_at_mut(j);
        let column = &mut rest[0];

        for _ in 0..2 {
            for basis in done.iter() {
                let projection = dot(basis, &column[..]);
                column.iter_mut().zip(basis).for_each(|(c, b)| *c -= projection * b);
            }
        }

        let norm = dot(&column[..], &column[..]).sqrt();
        if original == 0.0 || norm <= RANK_TOLERANCE * original {
            column.iter_mut().for_each(|c| *c = 0.0);
        } else {
            column.iter_mut().for_each(|c| *c /= norm);
        }
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// On return the diagonal of `a` holds the eigenvalues; the returned
/// matrix holds the matching eigenvectors as columns.
fn jacobi_eigen(a: &mut [Vec<f64>]) -> Vec<Vec<f64>> {
    let size = a.len();
    let mut v: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let total: f64 = a.iter().flatten().map(|x| x * x).sum();
    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..size)
            .flat_map(|i| (0..size).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off <= JACOBI_TOLERANCE * total.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..size {
            for q in (p + 1)..size {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = if theta.abs() > 1e150 {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (xp, xq) = (row[p], row[q]);
                    row[p] = c * xp - s * xq;
                    row[q] = s * xp + c * xq;
                }
                for k in 0..size {
                    let (xp, xq) = (a[p][k], a[q][k]);
                    a[p][k] = c * xp - s * xq;
                    a[q][k] = s * xp + c * xq;
                }
                for row in v.iter_mut() {
                    let (xp, xq) = (row[p], row[q]);
                    row[p] = c * xp - s * xq;
                    row[q] = s * xp + c * xq;
                }
            }
        }
    }
    v
}
