//! Document codec
//!
//! Converts between a column's hierarchical payload and flat documents:
//! - [`decompose`] flattens a datasource submission into documents
//! - [`recompose`] rebuilds the column, keeping one winner per coordinate

mod decompose;
mod recompose;

pub use decompose::decompose;
pub use recompose::recompose;

use std::cmp::Ordering;

use crate::models::Document;

/// Order two contributions at the same coordinate.
///
/// Higher weight wins. Equal weights fall back to the datasource name, the
/// lexicographically smaller one winning, so the result never depends on the
/// order documents were read in.
pub fn rank(a: &Document, b: &Document) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| b.datasource.cmp(&a.datasource))
}

/// True when `candidate` should replace `incumbent`
pub fn outranks(candidate: &Document, incumbent: &Document) -> bool {
    rank(candidate, incumbent) == Ordering::Greater
}
