//! Inserting and removing highlight elements.
//!
//! Every element the wrapper creates carries [`MARK_ATTRIBUTE`], which is
//! what the unwrapper looks for, so elements of the same tag written by
//! other code are left alone. Elements of a match that spans several text
//! nodes also carry [`PART_ATTRIBUTE`] with their position in the match.

mod unwrapper;
mod wrapper;

pub use unwrapper::Unwrapper;
pub use wrapper::Wrapper;

/// Attribute present on every highlight element.
pub const MARK_ATTRIBUTE: &str = "data-mark";

/// Part index of an element within a multi-element match.
pub const PART_ATTRIBUTE: &str = "data-mark-part";
