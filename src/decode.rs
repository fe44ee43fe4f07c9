//! Streaming binary decoder for the embedding wire format.
//!
//! The wire format is fixed:
//!
//! ```text
//! offset 0:  u32 little-endian  N  (sample count)
//! offset 4:  u32 little-endian  D  (dimension count)
//! offset 8:  N * D  f32 little-endian, row-major
//! ```
//!
//! No padding, no footer, no compression. The decoder pulls bytes from any
//! [`Read`] transport, buffering across transport-chunk boundaries, and
//! yields decoded row batches with a fractional progress value. Consumers
//! may stop pulling at any time; dropping the decoder releases its buffer.
//!
//! Truncation is fatal: a stream that ends before the 8-byte header, or
//! mid-row, fails with [`Error::Format`]. Ingestion built on top of this
//! decoder is all-or-nothing by design.

use crate::error::{Error, Result};
use std::io::Read;
use tracing::debug;

/// Default number of rows per decoded chunk.
pub const DEFAULT_CHUNK_ROWS: usize = 1000;

const HEADER_BYTES: usize = 8;
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// The two header-derived stream constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    /// Total number of samples in the stream.
    pub n_samples: usize,
    /// Dimension count of every sample.
    pub n_dimensions: usize,
}

/// One decoded batch of rows.
#[derive(Clone, Debug)]
pub struct DecodedChunk {
    /// Fraction of all samples decoded so far, in `[0, 1]`.
    pub progress: f64,
    /// The rows decoded in this chunk, each of length `n_dimensions`.
    pub rows: Vec<Vec<f32>>,
    /// Total sample count from the header.
    pub n_samples: usize,
    /// Dimension count from the header.
    pub n_dimensions: usize,
}

/// Pull-based decoder over a byte transport.
///
/// Implements [`Iterator`], yielding up to `chunk_rows` rows per chunk; the
/// final chunk may be short. Decoding stops after exactly `N` rows
/// regardless of trailing bytes. The sequence is finite and
/// non-restartable.
///
/// # Example
/// ```rust
/// use std::io::Cursor;
/// use projector::{encode_stream, StreamDecoder};
///
/// let bytes = encode_stream(&[vec![1.0_f32, 2.0], vec![3.0, 4.0]], 2)?;
/// let decoder = StreamDecoder::new(Cursor::new(bytes));
/// for chunk in decoder {
///     let chunk = chunk?;
///     assert_eq!(chunk.n_dimensions, 2);
/// }
/// # Ok::<(), projector::Error>(())
/// ```
pub struct StreamDecoder<R> {
    reader: R,
    chunk_rows: usize,
    buffer: Vec<u8>,
    header: Option<StreamHeader>,
    rows_emitted: usize,
    finished: bool,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a decoder with the default chunk size of
    /// [`DEFAULT_CHUNK_ROWS`] rows.
    pub fn new(reader: R) -> Self {
        Self::with_chunk_rows(reader, DEFAULT_CHUNK_ROWS)
    }

    /// Create a decoder emitting up to `chunk_rows` rows per chunk.
    ///
    /// # Panics
    /// Panics if `chunk_rows` is zero.
    pub fn with_chunk_rows(reader: R, chunk_rows: usize) -> Self {
        assert!(chunk_rows > 0, "chunk_rows must be positive");
        Self {
            reader,
            chunk_rows,
            buffer: Vec::new(),
            header: None,
            rows_emitted: 0,
            finished: false,
        }
    }

    /// The stream constants, available once the header has been parsed.
    ///
    /// For an `N = 0` stream the iterator yields no chunks, but the header
    /// is still parsed on the first `next()` call and remains readable here.
    pub fn header(&self) -> Option<StreamHeader> {
        self.header
    }

    /// Pull transport bytes until the buffer holds `needed` bytes or the
    /// stream ends. Returns the buffered byte count.
    fn fill_buffer(&mut self, needed: usize) -> Result<usize> {
        let mut scratch = [0u8; READ_BUFFER_BYTES];
        while self.buffer.len() < needed {
            let read = self.reader.read(&mut scratch)?;
            if read == 0 {
                break;
            }
            self.buffer.extend_from_slice(&scratch[..read]);
        }
        Ok(self.buffer.len())
    }

    fn parse_header(&mut self) -> Result<StreamHeader> {
        if self.fill_buffer(HEADER_BYTES)? < HEADER_BYTES {
            return Err(Error::Format(format!(
                "stream ended after {} bytes, before the 8-byte header",
                self.buffer.len()
            )));
        }

        let n_samples = u32::from_le_bytes(self.buffer[0..4].try_into().expect("4 bytes")) as usize;
        let n_dimensions =
            u32::from_le_bytes(self.buffer[4..8].try_into().expect("4 bytes")) as usize;
        self.buffer.drain(..HEADER_BYTES);

        let header = StreamHeader {
            n_samples,
            n_dimensions,
        };
        self.header = Some(header);
        Ok(header)
    }

    fn next_chunk(&mut self) -> Result<Option<DecodedChunk>> {
        let header = match self.header {
            Some(header) => header,
            None => self.parse_header()?,
        };

        let remaining = header.n_samples - self.rows_emitted;
        if remaining == 0 {
            self.finished = true;
            return Ok(None);
        }

        let rows_wanted = remaining.min(self.chunk_rows);
        let row_bytes = header.n_dimensions * 4;
        let needed = rows_wanted * row_bytes;

        if self.fill_buffer(needed)? < needed {
            // Transport ended early. Distinguish a ragged row from a clean
            // row boundary for the error message; both are fatal.
            return if row_bytes > 0 && self.buffer.len() % row_bytes != 0 {
                Err(Error::Format(format!(
                    "stream ended mid-row: {} trailing bytes are not a multiple of {}",
                    self.buffer.len(),
                    row_bytes
                )))
            } else {
                Err(Error::Format(format!(
                    "stream ended after {} of {} samples",
                    self.rows_emitted + self.buffer.len() / row_bytes.max(1),
                    header.n_samples
                )))
            };
        }

        let mut rows = Vec::with_capacity(rows_wanted);
        for row_index in 0..rows_wanted {
            let start = row_index * row_bytes;
            let mut row = Vec::with_capacity(header.n_dimensions);
            for value in self.buffer[start..start + row_bytes].chunks_exact(4) {
                row.push(f32::from_le_bytes(value.try_into().expect("4 bytes")));
            }
            rows.push(row);
        }
        self.buffer.drain(..needed);

        self.rows_emitted += rows_wanted;
        if self.rows_emitted == header.n_samples {
            // Exactly N rows decoded; trailing bytes, if any, are ignored.
            self.finished = true;
        }

        let progress = self.rows_emitted as f64 / header.n_samples as f64;
        debug!(
            rows = rows_wanted,
            emitted = self.rows_emitted,
            total = header.n_samples,
            progress,
            "decoded chunk"
        );

        Ok(Some(DecodedChunk {
            progress,
            rows,
            n_samples: header.n_samples,
            n_dimensions: header.n_dimensions,
        }))
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = Result<DecodedChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Encode rows into the embedding wire format.
///
/// The inverse of [`StreamDecoder`]: writes the `N`/`D` header followed by
/// the row-major f32 payload. Every row must have length `dimension`.
pub fn encode_stream(rows: &[Vec<f32>], dimension: usize) -> Result<Vec<u8>> {
    let n = u32::try_from(rows.len())
        .map_err(|_| Error::InvalidArgument(format!("sample count {} exceeds u32", rows.len())))?;
    let d = u32::try_from(dimension)
        .map_err(|_| Error::InvalidArgument(format!("dimension {} exceeds u32", dimension)))?;

    let mut bytes = Vec::with_capacity(HEADER_BYTES + rows.len() * dimension * 4);
    bytes.extend_from_slice(&n.to_le_bytes());
    bytes.extend_from_slice(&d.to_le_bytes());
    for row in rows {
        if row.len() != dimension {
            return Err(Error::Schema {
                expected: dimension,
                got: row.len(),
            });
        }
        for &value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(bytes: Vec<u8>, chunk_rows: usize) -> Result<Vec<DecodedChunk>> {
        StreamDecoder::with_chunk_rows(Cursor::new(bytes), chunk_rows).collect()
    }

    #[test]
    fn test_round_trip_many_rows() {
        let rows: Vec<Vec<f32>> = (0..7)
            .map(|i| (0..3).map(|j| (i * 3 + j) as f32 * 0.5 - 4.0).collect())
            .collect();
        let bytes = encode_stream(&rows, 3).unwrap();

        let chunks = decode_all(bytes, 2).unwrap();
        assert_eq!(chunks.len(), 4); // 2 + 2 + 2 + 1

        let decoded: Vec<Vec<f32>> = chunks.iter().flat_map(|c| c.rows.clone()).collect();
        assert_eq!(decoded, rows);

        assert_eq!(chunks[0].n_samples, 7);
        assert_eq!(chunks[0].n_dimensions, 3);
        assert!((chunks[0].progress - 2.0 / 7.0).abs() < 1e-12);
        assert!((chunks[3].progress - 1.0).abs() < 1e-12);
        assert_eq!(chunks[3].rows.len(), 1);
    }

    #[test]
    fn test_round_trip_single_row() {
        let rows = vec![vec![1.5f32, -2.25, 3.125, 0.0]];
        let bytes = encode_stream(&rows, 4).unwrap();

        let chunks = decode_all(bytes, 1000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].rows, rows);
        assert_eq!(chunks[0].progress, 1.0);
    }

    #[test]
    fn test_empty_stream_yields_no_chunks_but_exposes_header() {
        let bytes = encode_stream(&[], 16).unwrap();
        let mut decoder = StreamDecoder::new(Cursor::new(bytes));

        assert!(decoder.header().is_none());
        assert!(decoder.next().is_none());
        assert_eq!(
            decoder.header(),
            Some(StreamHeader {
                n_samples: 0,
                n_dimensions: 16
            })
        );
    }

    #[test]
    fn test_round_trip_exact_f32_values() {
        // Values with no exact short decimal representation survive the trip
        // bit-for-bit.
        let rows = vec![vec![0.1f32, 1.0 / 3.0, f32::MIN_POSITIVE, -0.0]];
        let bytes = encode_stream(&rows, 4).unwrap();

        let chunks = decode_all(bytes, 1000).unwrap();
        for (decoded, original) in chunks[0].rows[0].iter().zip(rows[0].iter()) {
            assert_eq!(decoded.to_bits(), original.to_bits());
        }
    }

    #[test]
    fn test_truncated_header_is_format_error() {
        for len in 0..8 {
            let bytes = vec![0u8; len];
            let result: Result<Vec<_>> = decode_all(bytes, 1000);
            assert!(
                matches!(result, Err(Error::Format(_))),
                "expected Format error for {}-byte stream",
                len
            );
        }
    }

    #[test]
    fn test_mid_row_truncation_is_format_error() {
        // Header promises 2 samples of dimension 2, payload holds 1.5 rows.
        let mut bytes = encode_stream(&[vec![1.0f32, 2.0], vec![3.0, 4.0]], 2).unwrap();
        bytes.truncate(8 + 12);

        let result = decode_all(bytes, 1000);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_short_stream_on_row_boundary_is_format_error() {
        // Header promises 3 samples, payload holds exactly 2 complete rows.
        let mut bytes =
            encode_stream(&[vec![1.0f32, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]], 2).unwrap();
        bytes.truncate(8 + 16);
        // Rewrite nothing: the header still says 3.
        let result = decode_all(bytes, 1000);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let rows = vec![vec![1.0f32], vec![2.0]];
        let mut bytes = encode_stream(&rows, 1).unwrap();
        bytes.extend_from_slice(&[0xAB; 13]);

        let chunks = decode_all(bytes, 1000).unwrap();
        let decoded: Vec<Vec<f32>> = chunks.iter().flat_map(|c| c.rows.clone()).collect();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_decoder_stops_after_error() {
        let bytes = vec![0u8; 5];
        let mut decoder = StreamDecoder::new(Cursor::new(bytes));
        assert!(matches!(decoder.next(), Some(Err(Error::Format(_)))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_buffering_across_small_transport_reads() {
        // A reader that hands out one byte at a time forces the decoder to
        // buffer across every transport boundary.
        struct OneByte(Cursor<Vec<u8>>);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let mut byte = [0u8; 1];
                let read = self.0.read(&mut byte)?;
                if read == 1 {
                    buf[0] = byte[0];
                }
                Ok(read)
            }
        }

        let rows: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32, -(i as f32)]).collect();
        let bytes = encode_stream(&rows, 2).unwrap();
        let chunks: Vec<DecodedChunk> =
            StreamDecoder::with_chunk_rows(OneByte(Cursor::new(bytes)), 2)
                .collect::<Result<_>>()
                .unwrap();

        let decoded: Vec<Vec<f32>> = chunks.iter().flat_map(|c| c.rows.clone()).collect();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_encode_rejects_ragged_rows() {
        let err = encode_stream(&[vec![1.0f32, 2.0], vec![3.0]], 2).unwrap_err();
        assert!(matches!(err, Error::Schema { expected: 2, got: 1 }));
    }
}
