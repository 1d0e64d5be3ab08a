//! Unified error types for hfa-anno.
//!
//! This module provides a unified error type that encompasses errors from the
//! HFA container reader, the annotation pipeline and the vector writers.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
