//! HFA (Erdas Imagine) container reader.
//!
//! HFA files (`.img`, `.ovr`, `.aux`) are trees of typed entries. Each entry
//! names a record type from the file's own data dictionary, and its data is
//! a packed instance of that type. This module exposes the subset needed to
//! pull annotation and map-projection records out of overlay files:
//!
//! - [`HfaFile`]: header, dictionary and the materialized entry tree
//! - [`Node`] / [`NodeData`]: borrowed entry views with path-based field access
//! - [`FieldCursor`]: ordered field-by-field decoding of a record
//! - [`MatrixBlock`]: basedata matrices with an explicit [`PairLayout`]
//!
//! Writing HFA files is not supported.

/// Constants for the HFA file format
pub mod consts;

/// Data dictionary parsing
pub mod dictionary;

/// Entry views and typed field access
mod entry;

/// Error type for container parsing
mod error;

/// Field cursors and value extraction
pub mod field;

/// Header and entry tree
mod file;

/// Basedata matrix blocks
pub mod matrix;

#[cfg(test)]
pub(crate) mod fixture;

// Re-export public types for convenient access
pub use dictionary::{Dictionary, HfaField, HfaType, ItemType};
pub use entry::{Node, NodeData, TreeDump};
pub use error::{HfaError, HfaResult};
pub use field::{FieldCursor, FieldSpan, FieldValue};
pub use file::{Entry, HfaFile, is_hfa_file};
pub use matrix::{ElementType, MatrixBlock, PairLayout};
