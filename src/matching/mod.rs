//! String matching primitives used by the resolver
//!
//! Two separate notions of "same name":
//! - [`normalize`] produces the canonical key for exact comparisons
//!   (punctuation and whitespace removed, lowercased)
//! - [`distance`] measures edit distance on [`fuzzy_key`] text, which keeps
//!   spaces and punctuation so token boundaries still cost an edit

mod distance;
mod normalize;

pub use distance::distance;
pub use normalize::{fuzzy_key, normalize, tokens};
