//! Text handling: flattening leaves into a logical string and diacritic tables.

pub mod diacritics;
pub mod flatten;

pub use flatten::{LogicalString, Segment};
