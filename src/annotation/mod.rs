//! Annotation extraction.
//!
//! Annotation overlays keep user-drawn shapes under an element list entry.
//! Each `Element_Eant` / `Element_2_Eant` record carries metadata, an
//! element-type id and an affine transform; its single child is the shape
//! record (`Rectangle2`, `Eant_Ellipse`, `Text2`, `Eant_Polyline`, ...) in
//! local coordinates.
//!
//! ```no_run
//! use hfa_anno::annotation::{AnnotationLayer, ExtractOptions};
//!
//! # fn main() -> Result<(), hfa_anno::Error> {
//! let layer = AnnotationLayer::open("site.ovr", &ExtractOptions::default())?;
//! for annotation in layer.annotations() {
//!     println!("{} {}", annotation.id(), annotation.to_wkt());
//! }
//! # Ok(())
//! # }
//! ```

mod collector;
mod config;
pub mod consts;
mod element;
mod error;
mod layer;
mod registry;
pub mod shape;
mod transform;
pub mod wkt;

#[cfg(test)]
pub(crate) mod fixture;

pub use collector::{AnnotationCollector, Collected};
pub use config::ExtractOptions;
pub use element::Annotation;
pub use error::{AnnotationError, AnnotationResult};
pub use layer::AnnotationLayer;
pub use registry::{DEFAULT_REGISTRY, ShapeFactory, ShapeRegistry};
pub use shape::{Coord, ShapeGeometry, ShapeKind, rotate};
pub use transform::AffineTransform;
pub use wkt::GeometryKind;
