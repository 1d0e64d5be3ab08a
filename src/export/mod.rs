//! Vector output.
//!
//! Writers receive features as attribute lists plus WKT geometry through
//! [`VectorWriter`]. Most vector formats hold a single geometry type per
//! layer, so [`export_layer`] splits an [`AnnotationLayer`] into one output
//! layer per [`GeometryKind`].
//!
//! - [`ShapefileWriter`]: `.shp/.shx/.dbf/.prj/.cpg` per layer
//! - [`GeoJsonWriter`]: one FeatureCollection file per layer

mod dbf;
mod geojson;
mod shapefile;
mod shp;


pub use geojson::GeoJsonWriter;
pub use shapefile::ShapefileWriter;

use crate::annotation::{Annotation, AnnotationLayer, GeometryKind};
use crate::srs::SpatialReference;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Errors raised while writing vector output.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid WKT geometry: {0}")]
    Wkt(String),

    #[error("{expected} layer cannot hold a {found} geometry")]
    GeometryMismatch {
        expected: GeometryKind,
        found: &'static str,
    },

    #[error("unknown layer handle {0}")]
    UnknownLayer(usize),

    #[error("a {0} layer already exists")]
    DuplicateLayer(GeometryKind),

    #[error("unknown attribute field '{0}'")]
    UnknownField(String),

    #[error("invalid attribute field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("writer already finished")]
    Finished,
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Attribute column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
}

/// One attribute value of a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Integer(i64),
    String(&'a str),
}

/// Handle to a layer created by a [`VectorWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Sink for per-geometry-kind feature layers.
pub trait VectorWriter {
    /// Start a layer holding geometries of `kind`.
    fn create_layer(
        &mut self,
        kind: GeometryKind,
        srs: Option<&SpatialReference>,
    ) -> ExportResult<LayerId>;

    /// Declare an attribute column. All columns precede the first feature.
    fn create_field(
        &mut self,
        layer: LayerId,
        name: &str,
        field_type: FieldType,
        width: usize,
    ) -> ExportResult<()>;

    /// Append a feature. Attributes not listed are left empty.
    fn write_feature(
        &mut self,
        layer: LayerId,
        attributes: &[(&str, AttributeValue<'_>)],
        wkt: &str,
    ) -> ExportResult<()>;

    /// Flush every layer to disk, returning the files written.
    fn finish(&mut self) -> ExportResult<Vec<PathBuf>>;
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Shapefile,
    GeoJson,
}

impl OutputFormat {
    /// Writer producing files named `<stem>_<kind>.*` in `dir`.
    pub fn writer(self, dir: &Path, stem: &str) -> Box<dyn VectorWriter> {
        match self {
            OutputFormat::Shapefile => Box::new(ShapefileWriter::new(dir, stem)),
            OutputFormat::GeoJson => Box::new(GeoJsonWriter::new(dir, stem)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shp" | "shapefile" | "esri shapefile" => Ok(OutputFormat::Shapefile),
            "geojson" | "json" => Ok(OutputFormat::GeoJson),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

// Attribute columns of every layer.
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "desc";
/// Point layers only.
pub const FIELD_TEXT: &str = "text";

const ID_WIDTH: usize = 10;
const STRING_WIDTH: usize = 254;

/// What [`export_layer`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Feature count per output layer
    pub layers: Vec<(GeometryKind, usize)>,
    /// Files written
    pub files: Vec<PathBuf>,
}

fn attributes<'a>(
    annotation: &'a Annotation,
    kind: GeometryKind,
) -> Vec<(&'static str, AttributeValue<'a>)> {
    let mut attrs = vec![
        (FIELD_ID, AttributeValue::Integer(annotation.id())),
        (
            FIELD_NAME,
            AttributeValue::String(annotation.name().unwrap_or("")),
        ),
        (
            FIELD_DESCRIPTION,
            AttributeValue::String(annotation.description().unwrap_or("")),
        ),
    ];
    if kind == GeometryKind::Point {
        attrs.push((
            FIELD_TEXT,
            AttributeValue::String(annotation.text().unwrap_or("")),
        ));
    }
    attrs
}

/// Write `layer` through `writer`, one output layer per geometry kind present,
/// then finish the writer.
pub fn export_layer<W: VectorWriter + ?Sized>(
    layer: &AnnotationLayer,
    writer: &mut W,
) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();

    for kind in layer.geometry_kinds() {
        let id = writer.create_layer(kind, layer.srs())?;
        writer.create_field(id, FIELD_ID, FieldType::Integer, ID_WIDTH)?;
        writer.create_field(id, FIELD_NAME, FieldType::String, STRING_WIDTH)?;
        writer.create_field(id, FIELD_DESCRIPTION, FieldType::String, STRING_WIDTH)?;
        if kind == GeometryKind::Point {
            writer.create_field(id, FIELD_TEXT, FieldType::String, STRING_WIDTH)?;
        }

        let mut count = 0;
        for annotation in layer
            .annotations()
            .iter()
            .filter(|a| a.geometry_kind() == kind)
        {
            writer.write_feature(id, &attributes(annotation, kind), &annotation.to_wkt())?;
            count += 1;
        }
        debug!(%kind, features = count, "wrote layer");
        summary.layers.push((kind, count));
    }

    summary.files = writer.finish()?;
    Ok(summary)
}

/// Parse WKT into a `geo-types` geometry.
pub(crate) fn parse_wkt(text: &str) -> ExportResult<geo_types::Geometry<f64>> {
    let parsed = wkt::Wkt::<f64>::from_str(text).map_err(|e| ExportError::Wkt(e.to_string()))?;
    parsed
        .try_into()
        .map_err(|e: wkt::conversion::Error| ExportError::Wkt(format!("{:?}", e)))
}

/// Name of a geometry variant, for error messages.
pub(crate) fn geometry_name(geometry: &geo_types::Geometry<f64>) -> &'static str {
    use geo_types::Geometry;
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
