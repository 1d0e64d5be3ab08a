//! Unified error types for hfa-anno.
use thiserror::Error;

/// Main error type for hfa-anno operations.
///
/// Every variant here aborts processing of the current file. Per-node
/// problems (corrupt entries, unsupported shapes, malformed transforms) are
/// logged and skipped by the collector and never surface as an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the HFA header tag
    #[error("Not a valid HFA file")]
    NotHfaFile,

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    /// Required node not present in the entry tree
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// The annotation element list node is absent
    #[error("Element list '{0}' not found")]
    MissingElementList(String),

    /// The file holds no supported annotations
    #[error("No supported annotations found")]
    NoAnnotations,

    /// Caller supplied an unusable input path or option
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Vector output failed
    #[error("Export error: {0}")]
    Export(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for hfa-anno operations.
pub type Result<T> = std::result::Result<T, Error>;
