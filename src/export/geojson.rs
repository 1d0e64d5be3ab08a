use super::{
    AttributeValue, ExportError, ExportResult, FieldType, LayerId, VectorWriter, geometry_name,
    parse_wkt,
};
use crate::annotation::GeometryKind;
use crate::srs::SpatialReference;
use geo_types::{Geometry, LineString, Polygon};
use serde_json::{Map, Value, json};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

struct GeoJsonLayer {
    kind: GeometryKind,
    /// EPSG code for the `crs` member
    epsg: Option<u32>,
    fields: Vec<(String, FieldType)>,
    features: Vec<Value>,
}

/// GeoJSON output, one `FeatureCollection` file per layer:
/// `<dir>/<stem>_<points|lines|polygons>.geojson`.
pub struct GeoJsonWriter {
    dir: PathBuf,
    stem: String,
    layers: Vec<GeoJsonLayer>,
    finished: bool,
}

fn line_coordinates(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![line_coordinates(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_coordinates));
    Value::Array(rings)
}

/// GeoJSON geometry object for a layer of `kind`.
fn geometry_json(kind: GeometryKind, geometry: &Geometry<f64>) -> ExportResult<Value> {
    let (ty, coordinates) = match (kind, geometry) {
        (GeometryKind::Point, Geometry::Point(p)) => ("Point", json!([p.x(), p.y()])),
        (GeometryKind::LineString, Geometry::LineString(line)) => {
            ("LineString", line_coordinates(line))
        },
        (GeometryKind::LineString, Geometry::MultiLineString(lines)) => (
            "MultiLineString",
            Value::Array(lines.iter().map(line_coordinates).collect()),
        ),
        (GeometryKind::Polygon, Geometry::Polygon(polygon)) => {
            ("Polygon", polygon_coordinates(polygon))
        },
        (GeometryKind::Polygon, Geometry::MultiPolygon(polygons)) => (
            "MultiPolygon",
            Value::Array(polygons.iter().map(polygon_coordinates).collect()),
        ),
        (expected, other) => {
            return Err(ExportError::GeometryMismatch {
                expected,
                found: geometry_name(other),
            });
        },
    };
    Ok(json!({ "type": ty, "coordinates": coordinates }))
}

impl GeoJsonWriter {
    pub fn new<P: AsRef<Path>>(dir: P, stem: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: stem.to_string(),
            layers: Vec::new(),
            finished: false,
        }
    }

    pub fn layer_name(&self, kind: GeometryKind) -> String {
        format!("{}_{}", self.stem, kind.layer_suffix())
    }

    pub fn layer_path(&self, kind: GeometryKind) -> PathBuf {
        self.dir.join(format!("{}.geojson", self.layer_name(kind)))
    }

    fn layer_mut(&mut self, layer: LayerId) -> ExportResult<&mut GeoJsonLayer> {
        if self.finished {
            return Err(ExportError::Finished);
        }
        self.layers
            .get_mut(layer.0)
            .ok_or(ExportError::UnknownLayer(layer.0))
    }

    fn collection(&self, layer: &GeoJsonLayer) -> Value {
        let mut root = Map::new();
        root.insert("type".into(), json!("FeatureCollection"));
        root.insert("name".into(), json!(self.layer_name(layer.kind)));
        if let Some(code) = layer.epsg {
            root.insert(
                "crs".into(),
                json!({
                    "type": "name",
                    "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
                }),
            );
        }
        root.insert("features".into(), Value::Array(layer.features.clone()));
        Value::Object(root)
    }
}

impl VectorWriter for GeoJsonWriter {
    fn create_layer(
        &mut self,
        kind: GeometryKind,
        srs: Option<&SpatialReference>,
    ) -> ExportResult<LayerId> {
        if self.finished {
            return Err(ExportError::Finished);
        }
        if self.layers.iter().any(|l| l.kind == kind) {
            return Err(ExportError::DuplicateLayer(kind));
        }
        self.layers.push(GeoJsonLayer {
            kind,
            epsg: srs.and_then(SpatialReference::epsg),
            fields: Vec::new(),
            features: Vec::new(),
        });
        Ok(LayerId(self.layers.len() - 1))
    }

    fn create_field(
        &mut self,
        layer: LayerId,
        name: &str,
        field_type: FieldType,
        _width: usize,
    ) -> ExportResult<()> {
        let layer = self.layer_mut(layer)?;
        let invalid = |reason: &str| ExportError::InvalidField {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if !layer.features.is_empty() {
            return Err(invalid("fields must be declared before features"));
        }
        if layer.fields.iter().any(|(n, _)| n == name) {
            return Err(invalid("duplicate field name"));
        }
        layer.fields.push((name.to_string(), field_type));
        Ok(())
    }

    fn write_feature(
        &mut self,
        layer: LayerId,
        attributes: &[(&str, AttributeValue<'_>)],
        wkt: &str,
    ) -> ExportResult<()> {
        let layer = self.layer_mut(layer)?;
        let geometry = geometry_json(layer.kind, &parse_wkt(wkt)?)?;

        if let Some((name, _)) = attributes
            .iter()
            .find(|(name, _)| !layer.fields.iter().any(|(n, _)| n == name))
        {
            return Err(ExportError::UnknownField(name.to_string()));
        }

        let mut properties = Map::new();
        for (name, field_type) in &layer.fields {
            let value = attributes.iter().find(|(n, _)| n == name).map(|(_, v)| *v);
            let value = match (field_type, value) {
                (_, None) => Value::Null,
                (FieldType::Integer, Some(AttributeValue::Integer(v))) => json!(v),
                (FieldType::String, Some(AttributeValue::String(s))) => json!(s),
                (FieldType::String, Some(AttributeValue::Integer(v))) => json!(v.to_string()),
                (FieldType::Integer, Some(AttributeValue::String(_))) => {
                    return Err(ExportError::InvalidField {
                        name: name.clone(),
                        reason: "text value for a numeric field".to_string(),
                    });
                },
            };
            properties.insert(name.clone(), value);
        }

        layer.features.push(json!({
            "type": "Feature",
            "properties": properties,
            "geometry": geometry,
        }));
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<Vec<PathBuf>> {
        if self.finished {
            return Err(ExportError::Finished);
        }
        self.finished = true;
        if self.layers.is_empty() {
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.dir)?;
        let mut written = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let path = self.layer_path(layer.kind);
            let mut out = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut out, &self.collection(layer))?;
            out.write_all(b"\n")?;
            out.flush()?;
            debug!(kind = %layer.kind, features = layer.features.len(), path = %path.display(), "wrote GeoJSON");
            written.push(path);
        }
        Ok(written)
    }
}
