//! Substring search over point metadata.
//!
//! The match predicate: the case-folded query is a substring of the
//! case-folded text rendering of at least one metadata value. An empty
//! query is a substring of every rendered value, so it matches every point
//! that carries metadata; this falls out of the predicate and is not
//! special-cased. Results preserve corpus index order, with no scoring.

use crate::corpus::Corpus;

/// Return the indices of all points with a metadata value matching `query`.
///
/// Matching is case-insensitive substring containment over every value in
/// the point's metadata record. The result is in ascending corpus order.
pub fn search(corpus: &Corpus, query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    corpus
        .iter()
        .enumerate()
        .filter(|(_, point)| {
            point
                .metadata()
                .values()
                .any(|value| value.to_text().to_lowercase().contains(&needle))
        })
        .map(|(index, _)| index)
        .collect()
}
