//! Vector corpus: ordered, stably-indexed storage for ingested points.
//!
//! The corpus owns the decoded points and is the identity authority for the
//! rest of the crate: neighbor results, search hits, and projection rows all
//! refer to corpus indices. Points are appended, never deleted or reordered,
//! so an index stays valid for the life of the corpus.
//!
//! The corpus is single-writer. [`Corpus::normalize`] rewrites every stored
//! vector in place and takes `&mut self`, so the borrow checker serializes
//! it against any concurrent read through the same handle. Callers sharing a
//! corpus across threads must either serialize mutation themselves or clone
//! a snapshot before normalizing.

use crate::error::{Error, Result};
use crate::point::DataPoint;
use tracing::debug;

/// Ordered collection of ingested embedding points.
///
/// Every vector has the same dimension `D`, established by the first point
/// appended; appending a mismatched point fails with [`Error::Schema`].
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    points: Vec<DataPoint>,
    dimension: Option<usize>,
}

impl Corpus {
    /// Create an empty corpus. The first appended point establishes the
    /// dimension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty corpus with a known dimension.
    ///
    /// Useful when the dimension arrives ahead of the points, as with the
    /// stream header.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            points: Vec::new(),
            dimension: Some(dimension),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the corpus holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The established vector dimension, if any point (or an explicit
    /// dimension) has been seen.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// The point at `index`, if in range.
    pub fn point(&self, index: usize) -> Option<&DataPoint> {
        self.points.get(index)
    }

    /// All points in corpus order.
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Iterate over points in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.points.iter()
    }

    /// Append points to the corpus.
    ///
    /// The whole batch is validated against the established dimension before
    /// anything is stored, so a failed append leaves the corpus unmodified.
    pub fn append(&mut self, points: impl IntoIterator<Item = DataPoint>) -> Result<()> {
        let batch: Vec<DataPoint> = points.into_iter().collect();
        if batch.is_empty() {
            return Ok(());
        }

        let expected = self.dimension.unwrap_or_else(|| batch[0].dimension());
        for point in &batch {
            if point.dimension() != expected {
                return Err(Error::Schema {
                    expected,
                    got: point.dimension(),
                });
            }
        }

        self.dimension = Some(expected);
        self.points.extend(batch);
        Ok(())
    }

    /// Normalize every dimension to zero mean and unit standard deviation,
    /// in place.
    ///
    /// Per dimension `j`, computes the population mean and standard
    /// deviation across all points and replaces each value `v` with
    /// `(v - mean_j) / std_j`. Dimensions with zero standard deviation are
    /// left unchanged. A no-op on an empty corpus.
    pub fn normalize(&mut self) {
        let n = self.points.len();
        let d = self.dimension.unwrap_or(0);
        if n == 0 || d == 0 {
            return;
        }

        let mut mean = vec![0.0f64; d];
        for point in &self.points {
            for (j, &v) in point.vector().iter().enumerate() {
                mean[j] += v as f64;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut std_dev = vec![0.0f64; d];
        for point in &self.points {
            for (j, &v) in point.vector().iter().enumerate() {
                let diff = v as f64 - mean[j];
                std_dev[j] += diff * diff;
            }
        }
        for s in &mut std_dev {
            *s = (*s / n as f64).sqrt();
        }

        for point in &mut self.points {
            for (j, v) in point.vector_mut().iter_mut().enumerate() {
                if std_dev[j] != 0.0 {
                    *v = ((*v as f64 - mean[j]) / std_dev[j]) as f32;
                }
            }
        }

        debug!(points = n, dimensions = d, "corpus normalized");
    }

    /// Build a read-only view of the referenced points.
    ///
    /// Each entry keeps its original corpus index, so neighbor and search
    /// results computed against the full corpus remain meaningful when only
    /// a subset is displayed. Fails with [`Error::Index`] if any index is
    /// out of range.
    pub fn subset(&self, indices: &[usize]) -> Result<SubsetView<'_>> {
        let mut entries = Vec::with_capacity(indices.len());
        for &index in indices {
            let point = self.points.get(index).ok_or(Error::Index {
                index,
                len: self.points.len(),
            })?;
            entries.push((index, point));
        }
        Ok(SubsetView { entries })
    }
}

/// Read-only view over a subset of a corpus.
///
/// Entries are `(original_index, point)` pairs in the order they were
/// requested.
#[derive(Clone, Debug)]
pub struct SubsetView<'a> {
    entries: Vec<(usize, &'a DataPoint)>,
}

impl<'a> SubsetView<'a> {
    /// Number of points in the view.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `position` within the view, as
    /// `(original_corpus_index, point)`.
    pub fn get(&self, position: usize) -> Option<(usize, &'a DataPoint)> {
        self.entries.get(position).copied()
    }

    /// Iterate over `(original_corpus_index, point)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a DataPoint)> + '_ {
        self.entries.iter().copied()
    }
}
