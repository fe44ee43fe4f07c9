//! Exact k-nearest-neighbor search over the corpus's native vector space.
//!
//! Brute-force Euclidean scan, O(N * D) per query: every candidate distance
//! is computed, the k smallest are kept. The scan parallelizes across
//! points; selection and ordering are sequential so results are exact and
//! deterministic. Equal distances order by ascending corpus index.
//!
//! When compiled with the `simd` feature, the squared-distance kernel uses
//! a SIMD implementation; the scalar path is the reference.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One neighbor hit: a corpus index and its Euclidean distance from the
/// query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborEntry {
    /// Corpus index of the neighbor.
    pub index: usize,
    /// Euclidean distance to the query point, non-negative.
    pub distance: f64,
}

/// Candidate ordered for a max-heap that keeps the k smallest distances:
/// the "greatest" candidate is the one to evict first, i.e. the farthest,
/// with the larger index losing ties.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    index: usize,
    distance_sq: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance_sq == other.distance_sq && self.index == other.index
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .partial_cmp(&other.distance_sq)
            .unwrap_or(Ordering::Equal)
            .then(self.index.cmp(&other.index))
    }
}

/// Find the `k` nearest neighbors of the point at `point_index`.
///
/// The query point itself is never returned. `k >= N - 1` returns all
/// other points sorted by distance (not an error); `k == 0` returns an
/// empty list. Fails with [`Error::Index`] if `point_index` is out of
/// range.
pub fn find_nearest_neighbors(
    corpus: &Corpus,
    point_index: usize,
    k: usize,
) -> Result<Vec<NeighborEntry>> {
    let query = corpus
        .point(point_index)
        .ok_or(Error::Index {
            index: point_index,
            len: corpus.len(),
        })?
        .vector();

    if k == 0 {
        return Ok(Vec::new());
    }

    let candidates: Vec<Candidate> = corpus
        .points()
        .par_iter()
        .enumerate()
        .filter(|(index, _)| *index != point_index)
        .map(|(index, point)| Candidate {
            index,
            distance_sq: squared_distance(query, point.vector()),
        })
        .collect();

    // Max-heap capped at k: push each candidate, evict the current worst.
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for candidate in candidates {
        heap.push(candidate);
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut nearest: Vec<Candidate> = heap.into_iter().collect();
    nearest.sort_unstable();

    Ok(nearest
        .into_iter()
        .map(|candidate| NeighborEntry {
            index: candidate.index,
            distance: candidate.distance_sq.sqrt(),
        })
        .collect())
}

/// Squared Euclidean distance, f64 accumulation.
#[cfg(not(feature = "simd"))]
fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dimension mismatch in distance");
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x as f64 - y as f64;
            diff * diff
        })
        .sum()
}

#[cfg(feature = "simd")]
fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    use simsimd::SpatialSimilarity;
    f32::sqeuclidean(a, b).unwrap_or(0.0)
}
