//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::export::ExportError;
use crate::hfa::HfaError;

impl From<HfaError> for Error {
    fn from(err: HfaError) -> Self {
        match err {
            HfaError::Io(e) => Error::Io(e),
            HfaError::NotHfaFile => Error::NotHfaFile,
            HfaError::InvalidFormat(s) => Error::InvalidFormat(s),
            HfaError::Binary(e) => Error::CorruptedFile(e.to_string()),
            HfaError::Dictionary(s) => Error::InvalidFormat(format!("dictionary: {}", s)),
            HfaError::UnknownType(s) => Error::InvalidFormat(format!("unknown type '{}'", s)),
            HfaError::UnsupportedItemType(c) => {
                Error::Unsupported(format!("HFA item type '{}'", c))
            },
            e @ HfaError::DataOutOfRange { .. } => Error::CorruptedFile(e.to_string()),
            e @ HfaError::FieldNotFound { .. } => Error::ComponentNotFound(e.to_string()),
            HfaError::Matrix(s) => Error::CorruptedFile(format!("matrix block: {}", s)),
        }
    }
}

impl From<ExportError> for Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => Error::Io(e),
            other => Error::Export(other.to_string()),
        }
    }
}
