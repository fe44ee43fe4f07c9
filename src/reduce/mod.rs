//! Projection engine: reduce corpus vectors to 2-3 dimensional coordinates.
//!
//! [`ReductionEngine`] dispatches by method name over a registry of
//! [`Algorithm`] implementations. Batch PCA is built in under `"pca"`;
//! additional methods (iterative or nonlinear) register under their own
//! names and must honor the same contract: N input rows produce N output
//! rows in corpus order. An unknown method name is an error, never a
//! silent fallback to a different method.

pub mod incremental;
pub mod jacobi;
pub mod pca;

pub use incremental::IncrementalPca;
pub use jacobi::{EigenPairs, JacobiEigen};
pub use pca::PrincipalComponents;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Projected coordinates: one row per corpus point, in corpus index order,
/// each row of the requested target dimensionality. Produced as a fresh
/// value per projection request.
pub type ProjectionResult = Vec<Vec<f64>>;

/// A dimensionality-reduction method.
///
/// Implementations map every corpus point to one output row, preserving
/// corpus order. Iterative methods may run internal optimization loops, but
/// the result for a given corpus and parameters must be reproducible.
pub trait Algorithm: Send + Sync {
    /// Project the corpus down to `target_dims` coordinates per point.
    fn project(&self, corpus: &Corpus, target_dims: usize) -> Result<ProjectionResult>;
}

/// Name-keyed registry of reduction algorithms.
pub struct ReductionEngine {
    algorithms: HashMap<String, Box<dyn Algorithm>>,
}

impl ReductionEngine {
    /// Create an engine with the built-in `"pca"` method registered.
    pub fn new() -> Self {
        let mut engine = Self {
            algorithms: HashMap::new(),
        };
        engine.register("pca", Box::new(PrincipalComponents::new()));
        engine
    }

    /// Register an algorithm under `name`, replacing any previous
    /// registration of that name.
    pub fn register(&mut self, name: impl Into<String>, algorithm: Box<dyn Algorithm>) {
        self.algorithms.insert(name.into(), algorithm);
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.algorithms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Project the corpus with the named method.
    ///
    /// Fails with [`Error::UnsupportedMethod`] for names with no registered
    /// algorithm.
    pub fn project(
        &self,
        corpus: &Corpus,
        method: &str,
        target_dims: usize,
    ) -> Result<ProjectionResult> {
        let algorithm = self
            .algorithms
            .get(method)
            .ok_or_else(|| Error::UnsupportedMethod(method.to_string()))?;
        algorithm.project(corpus, target_dims)
    }
}

impl Default for ReductionEngine {
    fn default() -> Self {
        Self::new()
    }
}
