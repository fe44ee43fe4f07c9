//! Batch principal-component analysis.
//!
//! The authoritative reduction method: mean-center the corpus, build the
//! sample covariance matrix, eigendecompose it with the Jacobi solver, and
//! project every point onto the leading components. Fully deterministic,
//! no randomness anywhere in the pipeline.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::reduce::jacobi::JacobiEigen;
use crate::reduce::{Algorithm, ProjectionResult};
use rayon::prelude::*;
use tracing::debug;

/// Principal-component analysis over the corpus's native vector space.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrincipalComponents {
    solver: JacobiEigen,
}

impl PrincipalComponents {
    /// Create a PCA reducer with the default eigensolver parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a PCA reducer with explicit eigensolver tolerance and sweep
    /// cap, for retrying a non-converged request with relaxed settings.
    pub fn with_solver_params(tolerance: f64, max_sweeps: usize) -> Self {
        Self {
            solver: JacobiEigen::with_params(tolerance, max_sweeps),
        }
    }
}

impl Algorithm for PrincipalComponents {
    fn project(&self, corpus: &Corpus, target_dims: usize) -> Result<ProjectionResult> {
        let n = corpus.len();
        let d = corpus.dimension().unwrap_or(0);

        if n <= 1 || d == 0 {
            return Err(Error::EmptyInput(format!(
                "covariance is undefined for {} points of dimension {}",
                n, d
            )));
        }
        if target_dims == 0 || target_dims > d {
            return Err(Error::InvalidArgument(format!(
                "target dimensionality {} must be in 1..={}",
                target_dims, d
            )));
        }

        // Mean and centering, accumulated in f64.
        let mut mean = vec![0.0f64; d];
        for point in corpus.iter() {
            for (j, &v) in point.vector().iter().enumerate() {
                mean[j] += v as f64;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut centered = vec![0.0f64; n * d];
        for (i, point) in corpus.iter().enumerate() {
            for (j, &v) in point.vector().iter().enumerate() {
                centered[i * d + j] = v as f64 - mean[j];
            }
        }

        // Sample covariance C = centered^T * centered / (n - 1). Each row of
        // the upper triangle is an independent unit of work.
        let mut covariance = vec![0.0f64; d * d];
        covariance
            .par_chunks_mut(d)
            .enumerate()
            .for_each(|(row, out)| {
                for col in row..d {
                    let mut sum = 0.0;
                    for k in 0..n {
                        sum += centered[k * d + row] * centered[k * d + col];
                    }
                    out[col] = sum / (n as f64 - 1.0);
                }
            });
        for row in 0..d {
            for col in 0..row {
                covariance[row * d + col] = covariance[col * d + row];
            }
        }

        let eigen = self.solver.decompose(&covariance, d)?;

        // Eigenvalue descending; ties broken by original column index
        // ascending so the output is stable.
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| {
            eigen.values[b]
                .partial_cmp(&eigen.values[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let components: Vec<&Vec<f64>> = order[..target_dims]
            .iter()
            .map(|&j| &eigen.vectors[j])
            .collect();

        debug!(
            points = n,
            source_dims = d,
            target_dims,
            leading_eigenvalue = eigen.values[order[0]],
            "pca projection computed"
        );

        let rows = (0..n)
            .map(|i| {
                let point = &centered[i * d..(i + 1) * d];
                components
                    .iter()
                    .map(|component| {
                        point
                            .iter()
                            .zip(component.iter())
                            .map(|(x, c)| x * c)
                            .sum()
                    })
                    .collect()
            })
            .collect();

        Ok(rows)
    }
}
