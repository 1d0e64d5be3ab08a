//! hfa-anno - Extract vector annotations from Erdas Imagine overlay files
//!
//! Erdas Imagine stores user-drawn annotations (text labels, rectangles,
//! ellipses, polylines, polygons) in HFA container files with the `.ovr`
//! extension. This crate reads those files without any native GIS library
//! and converts the annotations to WKT, Shapefiles or GeoJSON.
//!
//! # Features
//!
//! - **HFA reader**: entry tree, self-describing data dictionary, field
//!   paths and basedata matrices
//! - **Annotation decoding**: shape reconstruction in local coordinates and
//!   the per-element affine transform
//! - **Spatial reference**: UTM and geographic systems on well-known datums
//! - **Vector output**: ESRI Shapefile and GeoJSON, one layer per geometry kind
//! - **Batch conversion**: recursive directory conversion with a failure report
//!
//! # Example - Listing annotations
//!
//! ```no_run
//! use hfa_anno::{AnnotationLayer, ExtractOptions};
//!
//! # fn main() -> Result<(), hfa_anno::Error> {
//! let layer = AnnotationLayer::open("site.ovr", &ExtractOptions::default())?;
//! if let Some(srs) = layer.srs() {
//!     println!("srs: {}", srs);
//! }
//! for annotation in layer.annotations() {
//!     println!("{}: {}", annotation.id(), annotation.to_wkt());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Converting to Shapefiles
//!
//! ```no_run
//! use hfa_anno::{ConvertOptions, convert_file};
//!
//! # fn main() -> Result<(), hfa_anno::Error> {
//! let summary = convert_file("site.ovr", &ConvertOptions::new("out"))?;
//! for path in &summary.outputs {
//!     println!("wrote {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level HFA access
//!
//! ```no_run
//! use hfa_anno::hfa::HfaFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = HfaFile::open("site.ovr")?;
//! print!("{}", file.root().dump());
//! if let Some(node) = file.find("Map_Info") {
//!     let data = node.load_data()?;
//!     println!("{:?}", data.get_string_field("proName"));
//! }
//! # Ok(())
//! # }
//! ```

/// Shared binary readers and the unified error type
pub mod common;

/// HFA container reader
///
/// Materializes the entry tree, parses the data dictionary and decodes
/// entry data through field paths such as `vertices.coords` or
/// `proParams[3]`.
pub mod hfa;

/// Annotation decoding, geometry reconstruction and WKT output
pub mod annotation;

/// Spatial reference lookup from map information records
pub mod srs;

/// Shapefile and GeoJSON writers
pub mod export;

/// Single-file and batch conversion
pub mod convert;

pub use annotation::{Annotation, AnnotationLayer, ExtractOptions, GeometryKind};
pub use common::{Error, Result};
pub use convert::{BatchReport, ConvertOptions, ConvertSummary, convert_file, convert_path};
pub use export::{OutputFormat, VectorWriter};
pub use srs::SpatialReference;
