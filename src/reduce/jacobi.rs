//! Cyclic Jacobi eigensolver for symmetric matrices.
//!
//! Deterministic: the rotation order is fixed (row-cyclic over the upper
//! triangle), the convergence test is a fixed tolerance on the off-diagonal
//! Frobenius norm, and the sweep count is capped. Identical input always
//! produces identical output.
//!
//! Matrices are stored flat, row-major, `dim * dim` entries.

use crate::error::{Error, Result};
use tracing::trace;

/// Default off-diagonal Frobenius-norm tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default cap on full sweeps over the upper triangle.
pub const DEFAULT_MAX_SWEEPS: usize = 64;

/// Eigenvalues and eigenvectors of a symmetric matrix.
///
/// `values[j]` pairs with the unit-length column `vectors[j]`. Pairs are in
/// the matrix's original column order, unsorted; callers choose their own
/// ordering.
#[derive(Clone, Debug)]
pub struct EigenPairs {
    /// Eigenvalues, one per column of the input matrix.
    pub values: Vec<f64>,
    /// Unit-length eigenvectors, `vectors[j]` corresponding to `values[j]`.
    pub vectors: Vec<Vec<f64>>,
}

/// Cyclic Jacobi rotation solver.
#[derive(Clone, Copy, Debug)]
pub struct JacobiEigen {
    tolerance: f64,
    max_sweeps: usize,
}

impl Default for JacobiEigen {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }
}

impl JacobiEigen {
    /// Create a solver with the default tolerance and sweep cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver with an explicit tolerance and sweep cap.
    ///
    /// A caller whose projection request failed with
    /// [`Error::NonConvergence`] can retry with a relaxed tolerance as a
    /// separate, explicit request.
    pub fn with_params(tolerance: f64, max_sweeps: usize) -> Self {
        Self {
            tolerance,
            max_sweeps,
        }
    }

    /// Decompose a symmetric `dim x dim` matrix given in flat row-major
    /// form.
    ///
    /// Fails with [`Error::NonConvergence`] if the off-diagonal norm is
    /// still above tolerance after the sweep cap.
    ///
    /// # Panics
    /// Panics if `matrix.len() != dim * dim`.
    pub fn decompose(&self, matrix: &[f64], dim: usize) -> Result<EigenPairs> {
        assert_eq!(
            matrix.len(),
            dim * dim,
            "matrix length {} does not match dim {}",
            matrix.len(),
            dim
        );

        let mut a = matrix.to_vec();
        // Rotation accumulator starts as the identity; its columns become
        // the eigenvectors.
        let mut v = vec![0.0f64; dim * dim];
        for i in 0..dim {
            v[i * dim + i] = 1.0;
        }

        if dim > 1 {
            let mut converged = false;
            for sweep in 0..self.max_sweeps {
                let off = off_diagonal_norm(&a, dim);
                if off < self.tolerance {
                    trace!(sweep, off, "jacobi converged");
                    converged = true;
                    break;
                }
                for p in 0..dim - 1 {
                    for q in p + 1..dim {
                        rotate(&mut a, &mut v, dim, p, q);
                    }
                }
            }
            if !converged && off_diagonal_norm(&a, dim) >= self.tolerance {
                return Err(Error::NonConvergence(self.max_sweeps));
            }
        }

        let values: Vec<f64> = (0..dim).map(|i| a[i * dim + i]).collect();
        let vectors: Vec<Vec<f64>> = (0..dim)
            .map(|j| (0..dim).map(|i| v[i * dim + j]).collect())
            .collect();

        Ok(EigenPairs { values, vectors })
    }
}

/// Frobenius norm of the strictly off-diagonal part.
fn off_diagonal_norm(a: &[f64], dim: usize) -> f64 {
    let mut sum = 0.0;
    for p in 0..dim {
        for q in 0..dim {
            if p != q {
                let x = a[p * dim + q];
                sum += x * x;
            }
        }
    }
    sum.sqrt()
}

/// Apply one Jacobi rotation zeroing `a[p][q]`, updating the matrix and the
/// accumulated eigenvector columns.
fn rotate(a: &mut [f64], v: &mut [f64], dim: usize, p: usize, q: usize) {
    let apq = a[p * dim + q];
    if apq == 0.0 {
        return;
    }

    let app = a[p * dim + p];
    let aqq = a[q * dim + q];
    let theta = (aqq - app) / (2.0 * apq);
    // Smaller-magnitude root of t^2 + 2*theta*t - 1 = 0, for stability.
    let t = if theta >= 0.0 {
        1.0 / (theta + (1.0 + theta * theta).sqrt())
    } else {
        1.0 / (theta - (1.0 + theta * theta).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;

    a[p * dim + p] = app - t * apq;
    a[q * dim + q] = aqq + t * apq;
    a[p * dim + q] = 0.0;
    a[q * dim + p] = 0.0;

    for k in 0..dim {
        if k != p && k != q {
            let akp = a[k * dim + p];
            let akq = a[k * dim + q];
            a[k * dim + p] = c * akp - s * akq;
            a[p * dim + k] = a[k * dim + p];
            a[k * dim + q] = s * akp + c * akq;
            a[q * dim + k] = a[k * dim + q];
        }
    }

    for k in 0..dim {
        let vkp = v[k * dim + p];
        let vkq = v[k * dim + q];
        v[k * dim + p] = c * vkp - s * vkq;
        v[k * dim + q] = s * vkp + c * vkq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_desc(mut values: Vec<f64>) -> Vec<f64> {
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());
        values
    }

    #[test]
    fn test_diagonal_matrix_is_its_own_decomposition() {
        let matrix = vec![3.0, 0.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0, 1.0];
        let eigen = JacobiEigen::new().decompose(&matrix, 3).unwrap();

        assert_eq!(eigen.values, vec![3.0, 7.0, 1.0]);
        for (j, vector) in eigen.vectors.iter().enumerate() {
            for (i, &x) in vector.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((x - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_known_2x2() {
        // [[2, 1], [1, 2]] has eigenvalues 3 and 1.
        let matrix = vec![2.0, 1.0, 1.0, 2.0];
        let eigen = JacobiEigen::new().decompose(&matrix, 2).unwrap();

        let values = sorted_desc(eigen.values);
        assert!((values[0] - 3.0).abs() < 1e-9);
        assert!((values[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eigenvectors_satisfy_definition() {
        let matrix = vec![
            4.0, 1.0, 0.5, //
            1.0, 3.0, 0.25, //
            0.5, 0.25, 2.0,
        ];
        let eigen = JacobiEigen::new().decompose(&matrix, 3).unwrap();

        for (value, vector) in eigen.values.iter().zip(eigen.vectors.iter()) {
            // A v = lambda v, componentwise.
            for i in 0..3 {
                let av: f64 = (0..3).map(|j| matrix[i * 3 + j] * vector[j]).sum();
                assert!(
                    (av - value * vector[i]).abs() < 1e-8,
                    "A*v != lambda*v at component {}: {} vs {}",
                    i,
                    av,
                    value * vector[i]
                );
            }
        }
    }

    #[test]
    fn test_eigenvectors_are_orthonormal() {
        let matrix = vec![
            5.0, 2.0, 1.0, //
            2.0, 4.0, 0.5, //
            1.0, 0.5, 3.0,
        ];
        let eigen = JacobiEigen::new().decompose(&matrix, 3).unwrap();

        for j in 0..3 {
            for k in 0..3 {
                let dot: f64 = (0..3)
                    .map(|i| eigen.vectors[j][i] * eigen.vectors[k][i])
                    .sum();
                let expected = if j == k { 1.0 } else { 0.0 };
                assert!(
                    (dot - expected).abs() < 1e-9,
                    "vectors {} and {} have dot {}",
                    j,
                    k,
                    dot
                );
            }
        }
    }

    #[test]
    fn test_deterministic_across_calls() {
        let matrix = vec![
            2.5, -1.0, 0.75, //
            -1.0, 6.0, 0.1, //
            0.75, 0.1, 1.25,
        ];
        let first = JacobiEigen::new().decompose(&matrix, 3).unwrap();
        let second = JacobiEigen::new().decompose(&matrix, 3).unwrap();

        assert_eq!(first.values, second.values);
        assert_eq!(first.vectors, second.vectors);
    }

    #[test]
    fn test_zero_sweep_cap_fails_on_non_diagonal_input() {
        let matrix = vec![2.0, 1.0, 1.0, 2.0];
        let err = JacobiEigen::with_params(1e-9, 0)
            .decompose(&matrix, 2)
            .unwrap_err();
        assert!(matches!(err, Error::NonConvergence(0)));
    }

    #[test]
    fn test_one_by_one_matrix() {
        let eigen = JacobiEigen::new().decompose(&[42.0], 1).unwrap();
        assert_eq!(eigen.values, vec![42.0]);
        assert_eq!(eigen.vectors, vec![vec![1.0]]);
    }
}
