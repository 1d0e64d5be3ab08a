use crate::common::binary::BinaryError;
use std::io;
use thiserror::Error;

/// Error types for HFA container parsing
#[derive(Error, Debug)]
pub enum HfaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not an HFA file")]
    NotHfaFile,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid data: {0}")]
    Binary(#[from] BinaryError),

    #[error("Malformed data dictionary: {0}")]
    Dictionary(String),

    #[error("Type '{0}' is not defined in the data dictionary")]
    UnknownType(String),

    #[error("Unsupported item type '{0}'")]
    UnsupportedItemType(char),

    #[error("Data of entry '{entry}' ({size} bytes at {offset}) lies outside the file")]
    DataOutOfRange { entry: String, offset: u32, size: u32 },

    #[error("Field '{field}' not found in type '{type_name}'")]
    FieldNotFound { type_name: String, field: String },

    #[error("Invalid matrix block: {0}")]
    Matrix(String),
}

/// Result type for HFA operations
pub type HfaResult<T> = Result<T, HfaError>;
