//! Common types and utilities shared by the HFA reader and the annotation pipeline.

/// Little-endian binary readers
pub mod binary;

/// Unified error handling
pub mod error;

pub use error::{Error, Result};
