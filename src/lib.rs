//! # Projector: Embedding Projection Core
//!
//! Projector ingests a streamed binary payload of fixed-dimension embedding
//! vectors, reduces them to 2-3 dimensional coordinates for visualization,
//! and answers exact k-nearest-neighbor and metadata substring queries over
//! the original high-dimensional space.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use projector::{encode_stream, Projector};
//!
//! // Three 2-D embeddings in the binary wire format.
//! let bytes = encode_stream(&[vec![0.0_f32, 0.0], vec![3.0, 0.0], vec![0.0, 4.0]], 2)?;
//!
//! let mut projector = Projector::new();
//! projector.ingest(Cursor::new(bytes))?;
//!
//! // Exact nearest neighbor of point 0 in the original space.
//! let neighbors = projector.neighbors(0, 1)?;
//! assert_eq!(neighbors[0].index, 1);
//!
//! // Reduce to 2-D coordinates for the rendering surface.
//! let projected = projector.project("pca", 2)?.expect("latest request");
//! assert_eq!(projected.len(), 3);
//! # Ok::<(), projector::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Corpus**: the ordered, stably-indexed collection of ingested points.
//!   Every downstream result (projection rows, neighbor entries, search
//!   hits) refers to corpus indices.
//! - **Decoder**: a pull-based iterator over the wire format; ingestion is
//!   all-or-nothing.
//! - **Reduction engine**: batch PCA built in, with a registry for
//!   iterative or nonlinear methods behind the same contract.
//! - **Request tracker**: generation-counter gate that discards results of
//!   superseded projection requests.
//!
//! The rendering surface, input-event wiring, and page composition are
//! external collaborators: this crate exposes plain coordinate rows, index
//! lists, and neighbor entries, nothing visual.

pub mod corpus;
pub mod decode;
pub mod error;
pub mod neighbors;
pub mod point;
pub mod reduce;
pub mod requests;
pub mod search;

// Re-exports for convenience
pub use corpus::{Corpus, SubsetView};
pub use decode::{encode_stream, DecodedChunk, StreamDecoder, StreamHeader, DEFAULT_CHUNK_ROWS};
pub use error::{Error, Result};
pub use neighbors::{find_nearest_neighbors, NeighborEntry};
pub use point::{metadata_from_json, DataPoint, MetadataRecord, MetadataValue};
pub use reduce::{
    Algorithm, EigenPairs, IncrementalPca, JacobiEigen, PrincipalComponents, ProjectionResult,
    ReductionEngine,
};
pub use requests::{RequestTicket, RequestTracker};
pub use search::search;

use std::io::Read;
use tracing::debug;

/// Summary of a completed ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestSummary {
    /// Number of points now in the corpus.
    pub points: usize,
    /// Vector dimension established by the stream header.
    pub dimensions: usize,
}

/// The main Projector client: owns the corpus and the services around it.
///
/// Every service is also independently constructible; this struct is the
/// convenience wiring for the common decode-project-query flow, holding no
/// state beyond the corpus, the method registry, and the request counter.
///
/// # Example
/// ```rust
/// use std::io::Cursor;
/// use projector::{encode_stream, Projector};
///
/// let bytes = encode_stream(&[vec![1.0_f32], vec![2.0], vec![4.0]], 1)?;
/// let mut projector = Projector::new();
/// projector.ingest(Cursor::new(bytes))?;
///
/// // Every ingested point is tagged with its corpus index.
/// assert_eq!(projector.search("2"), vec![2]);
/// # Ok::<(), projector::Error>(())
/// ```
pub struct Projector {
    corpus: Corpus,
    engine: ReductionEngine,
    tracker: RequestTracker,
}

impl Projector {
    /// Create a client with an empty corpus and the built-in methods.
    pub fn new() -> Self {
        Self {
            corpus: Corpus::new(),
            engine: ReductionEngine::new(),
            tracker: RequestTracker::new(),
        }
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Decode a complete embedding stream and replace the corpus with its
    /// contents.
    ///
    /// Each point is tagged with an `"index"` metadata field holding its
    /// corpus index. Ingestion is all-or-nothing: on any decode failure the
    /// existing corpus is left untouched and no partial corpus is exposed.
    pub fn ingest<R: Read>(&mut self, reader: R) -> Result<IngestSummary> {
        self.ingest_with_chunk_rows(reader, DEFAULT_CHUNK_ROWS)
    }

    /// [`ingest`](Self::ingest) with an explicit decode-unit row count.
    pub fn ingest_with_chunk_rows<R: Read>(
        &mut self,
        reader: R,
        chunk_rows: usize,
    ) -> Result<IngestSummary> {
        let mut decoder = StreamDecoder::with_chunk_rows(reader, chunk_rows);

        let mut rows: Vec<Vec<f32>> = Vec::new();
        for chunk in &mut decoder {
            rows.extend(chunk?.rows);
        }
        let header = decoder
            .header()
            .ok_or_else(|| Error::Format("stream header missing".to_string()))?;

        let mut corpus = Corpus::with_dimension(header.n_dimensions);
        corpus.append(rows.into_iter().enumerate().map(|(index, vector)| {
            let mut metadata = MetadataRecord::new();
            metadata.insert("index".to_string(), MetadataValue::Number(index as f64));
            DataPoint::new(vector, metadata)
        }))?;

        let summary = IngestSummary {
            points: corpus.len(),
            dimensions: header.n_dimensions,
        };
        self.corpus = corpus;
        debug!(
            points = summary.points,
            dimensions = summary.dimensions,
            "ingestion complete"
        );
        Ok(summary)
    }

    // =========================================================================
    // Corpus access
    // =========================================================================

    /// The current corpus.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Normalize every corpus dimension to zero mean and unit standard
    /// deviation, in place. See [`Corpus::normalize`].
    pub fn normalize(&mut self) {
        self.corpus.normalize();
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Register a reduction method under `name`. See
    /// [`ReductionEngine::register`].
    pub fn register_method(&mut self, name: impl Into<String>, algorithm: Box<dyn Algorithm>) {
        self.engine.register(name, algorithm);
    }

    /// Registered reduction method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        self.engine.methods()
    }

    /// Project the corpus with the named method, gated by the request
    /// tracker.
    ///
    /// Returns `Ok(None)` when the request was superseded by a newer one
    /// before its result could be delivered, which can only happen when
    /// requests are issued concurrently through
    /// [`request_tracker`](Self::request_tracker) clones.
    pub fn project(&self, method: &str, target_dims: usize) -> Result<Option<ProjectionResult>> {
        let ticket = self.tracker.issue();
        let result = self.engine.project(&self.corpus, method, target_dims)?;
        Ok(self.tracker.deliver(ticket, result))
    }

    /// The request tracker gating projection delivery. Clone it into worker
    /// threads to supersede or gate in-flight computations.
    pub fn request_tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Exact k-nearest neighbors of the point at `point_index`. See
    /// [`find_nearest_neighbors`].
    pub fn neighbors(&self, point_index: usize, k: usize) -> Result<Vec<NeighborEntry>> {
        find_nearest_neighbors(&self.corpus, point_index, k)
    }

    /// Indices of all points with a metadata value containing `query`,
    /// case-insensitively. See [`search`].
    pub fn search(&self, query: &str) -> Vec<usize> {
        search(&self.corpus, query)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}
