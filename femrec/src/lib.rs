//! This library implements types and functions to normalize the FEM
//! descriptor files exported by structural-analysis tooling into one
//! canonical, self-describing model record, ready for consumption by
//! downstream dynamical-simulation software.
//!
//! The same logical model ships in two mutually incompatible encodings: an
//! older one laying channel groups out as flat arrays-of-records, and a
//! newer, large-file one laying them out as nested mappings. Both are read
//! here through one extraction engine, parametrized by a small source
//! capability trait, so that either encoding yields byte-for-byte identical
//! canonical output for the same model.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod channels;
pub mod errors;
pub mod model;
pub mod persist;
pub mod properties;
pub mod raw;
pub mod source;

#[cfg(test)]
mod tests;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use crate::channels::*;
  pub use crate::errors::*;
  pub use crate::model::*;
  pub use crate::persist::*;
  pub use crate::properties::*;
  pub use crate::raw::*;
  pub use crate::source::flat::*;
  pub use crate::source::tree::*;
  pub use crate::source::*;
}
