use crate::hfa::HfaError;
use thiserror::Error;

/// Why a single annotation element could not be decoded.
///
/// These are per-node failures: the collector logs them and moves on to the
/// next element.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error(transparent)]
    Hfa(#[from] HfaError),

    #[error("element type id {0} has no registered shape factory")]
    UnregisteredType(i64),

    #[error("shape node type '{0}' is not supported")]
    UnsupportedShape(String),

    #[error("element type id {id} ({name}) does not accept '{shape}' shapes")]
    ShapeMismatch {
        id: i64,
        name: &'static str,
        shape: String,
    },

    #[error("shape has {found} vertices, at least {required} required")]
    TooFewVertices { found: usize, required: usize },

    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}

pub type AnnotationResult<T> = std::result::Result<T, AnnotationError>;
