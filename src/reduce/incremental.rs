//! Incremental PCA: the extension-point reduction algorithm.
//!
//! Candid covariance-free incremental PCA (CCIPCA, Weng et al., 2003).
//! Tracks unnormalized component vectors whose norms approximate
//! eigenvalues; each observation is deflated through the learned components
//! so successive components capture successively smaller slices of
//! variance.
//!
//! Here the algorithm runs as a batch method behind the same [`Algorithm`]
//! contract as PCA: a fixed number of passes over the corpus in index
//! order, which keeps the result deterministic without any covariance
//! matrix or eigensolver. It exists to demonstrate that iterative methods
//! plug into the engine unchanged; batch PCA remains the authoritative
//! projection.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::reduce::{Algorithm, ProjectionResult};

const NORM_FLOOR: f64 = 1e-10;

/// Iterative PCA approximation implementing the engine's [`Algorithm`]
/// contract.
#[derive(Clone, Copy, Debug)]
pub struct IncrementalPca {
    passes: usize,
    amnesia: f64,
}

impl Default for IncrementalPca {
    fn default() -> Self {
        Self {
            passes: 4,
            amnesia: 2.0,
        }
    }
}

impl IncrementalPca {
    /// Create with the default pass count and amnesic parameter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an explicit number of passes over the corpus.
    ///
    /// More passes tighten the approximation toward the true leading
    /// components. `amnesia` is the forgetting exponent; values above 1
    /// down-weight early observations faster.
    pub fn with_params(passes: usize, amnesia: f64) -> Self {
        Self { passes, amnesia }
    }
}

impl Algorithm for IncrementalPca {
    fn project(&self, corpus: &Corpus, target_dims: usize) -> Result<ProjectionResult> {
        let n = corpus.len();
        let d = corpus.dimension().unwrap_or(0);

        if n <= 1 || d == 0 {
            return Err(Error::EmptyInput(format!(
                "cannot learn components from {} points of dimension {}",
                n, d
            )));
        }
        if target_dims == 0 || target_dims > d {
            return Err(Error::InvalidArgument(format!(
                "target dimensionality {} must be in 1..={}",
                target_dims, d
            )));
        }

        let mut mean = vec![0.0f64; d];
        for point in corpus.iter() {
            for (j, &v) in point.vector().iter().enumerate() {
                mean[j] += v as f64;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        // Row-major flat storage: components[i * d .. (i + 1) * d].
        let mut components = vec![0.0f64; target_dims * d];
        let mut seen = 0usize;

        for _ in 0..self.passes {
            for point in corpus.iter() {
                seen += 1;
                let mut x: Vec<f64> = point
                    .vector()
                    .iter()
                    .zip(mean.iter())
                    .map(|(&v, m)| v as f64 - m)
                    .collect();
                self.update(&mut components, &mut x, d, target_dims, seen);
            }
        }

        let rows = corpus
            .iter()
            .map(|point| {
                let x: Vec<f64> = point
                    .vector()
                    .iter()
                    .zip(mean.iter())
                    .map(|(&v, m)| v as f64 - m)
                    .collect();
                (0..target_dims)
                    .map(|i| {
                        let component = &components[i * d..(i + 1) * d];
                        let norm = norm(component);
                        if norm < NORM_FLOOR {
                            return 0.0;
                        }
                        x.iter()
                            .zip(component.iter())
                            .map(|(xj, cj)| xj * cj / norm)
                            .sum()
                    })
                    .collect()
            })
            .collect();

        Ok(rows)
    }
}

impl IncrementalPca {
    /// One CCIPCA update: fold the centered observation `x` into every
    /// component, deflating `x` between components.
    fn update(&self, components: &mut [f64], x: &mut [f64], d: usize, k: usize, seen: usize) {
        let t = seen as f64;
        for i in 0..k {
            let base = i * d;
            let v_norm = norm(&components[base..base + d]);

            if v_norm < NORM_FLOOR {
                // Seed a dead component with the current residual.
                if norm(x) > NORM_FLOOR {
                    let scale = (1.0 + self.amnesia) / t;
                    for (j, c) in components[base..base + d].iter_mut().enumerate() {
                        *c = x[j] * scale;
                    }
                }
            } else {
                let projection: f64 = (0..d).map(|j| x[j] * components[base + j] / v_norm).sum();
                let decay = (t - 1.0 - self.amnesia) / t;
                let grow = (1.0 + self.amnesia) / t * projection;
                for (j, c) in components[base..base + d].iter_mut().enumerate() {
                    *c = decay * *c + grow * x[j];
                }
            }

            // Deflate x through the freshly updated component.
            let v_new = norm(&components[base..base + d]);
            if v_new > NORM_FLOOR {
                let projection: f64 = (0..d).map(|j| x[j] * components[base + j] / v_new).sum();
                for (j, xj) in x.iter_mut().enumerate() {
                    *xj -= projection * components[base + j] / v_new;
                }
            }
        }
    }
}

#[inline]
fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
