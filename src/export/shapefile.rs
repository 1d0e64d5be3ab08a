use super::dbf::DbfTable;
use super::shp::{ShapeFileBuilder, ShpShape, shape_type};
use super::{AttributeValue, ExportError, ExportResult, FieldType, LayerId, VectorWriter, parse_wkt};
use crate::annotation::GeometryKind;
use crate::srs::SpatialReference;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Code page declared in the `.cpg` sidecar.
const CODE_PAGE: &str = "UTF-8";

struct ShapefileLayer {
    kind: GeometryKind,
    shapes: ShapeFileBuilder,
    table: DbfTable,
    /// ESRI WKT for the `.prj` sidecar
    prj: Option<String>,
}

/// ESRI Shapefile output.
///
/// Each layer becomes `<dir>/<stem>_<points|lines|polygons>` with `.shp`,
/// `.shx`, `.dbf` and `.cpg` files, plus `.prj` when the spatial reference
/// has an ESRI WKT form. Nothing touches the disk before [`finish`].
///
/// [`finish`]: VectorWriter::finish
pub struct ShapefileWriter {
    dir: PathBuf,
    stem: String,
    layers: Vec<ShapefileLayer>,
    finished: bool,
}

impl ShapefileWriter {
    pub fn new<P: AsRef<Path>>(dir: P, stem: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: stem.to_string(),
            layers: Vec::new(),
            finished: false,
        }
    }

    /// Path of a layer's file with extension `ext`.
    pub fn layer_path(&self, kind: GeometryKind, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, kind.layer_suffix(), ext))
    }

    fn layer_mut(&mut self, layer: LayerId) -> ExportResult<&mut ShapefileLayer> {
        if self.finished {
            return Err(ExportError::Finished);
        }
        self.layers
            .get_mut(layer.0)
            .ok_or(ExportError::UnknownLayer(layer.0))
    }
}

impl VectorWriter for ShapefileWriter {
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

        let prj = srs.and_then(|srs| {
            let wkt = srs.to_esri_wkt();
            if wkt.is_none() {
                warn!(srs = %srs, "no ESRI form for spatial reference, .prj omitted");
            }
            wkt
        });

        self.layers.push(ShapefileLayer {
            kind,
            shapes: ShapeFileBuilder::new(shape_type(kind)),
            table: DbfTable::new(),
            prj,
        });
        Ok(LayerId(self.layers.len() - 1))
    }

    fn create_field(
        &mut self,
        layer: LayerId,
        name: &str,
        field_type: FieldType,
        width: usize,
    ) -> ExportResult<()> {
        self.layer_mut(layer)?.table.add_field(name, field_type, width)
    }

    fn write_feature(
        &mut self,
        layer: LayerId,
        attributes: &[(&str, AttributeValue<'_>)],
        wkt: &str,
    ) -> ExportResult<()> {
        let layer = self.layer_mut(layer)?;
        let shape = ShpShape::from_geometry(layer.kind, &parse_wkt(wkt)?)?;
        layer.table.push(attributes)?;
        layer.shapes.add(&shape);
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
        let today = chrono::Local::now().date_naive();
        let mut written = Vec::new();

        for layer in &self.layers {
            let (shp, shx) = layer.shapes.generate()?;
            let dbf = layer.table.generate(today)?;

            let mut files: Vec<(&str, Vec<u8>)> = vec![
                ("shp", shp),
                ("shx", shx),
                ("dbf", dbf),
                ("cpg", CODE_PAGE.as_bytes().to_vec()),
            ];
            if let Some(prj) = &layer.prj {
                files.push(("prj", prj.clone().into_bytes()));
            }

            for (ext, bytes) in files {
                let path = self.layer_path(layer.kind, ext);
                fs::write(&path, bytes)?;
                written.push(path);
            }
            debug!(
                kind = %layer.kind,
                shapes = layer.shapes.len(),
                records = layer.table.len(),
                path = %self.layer_path(layer.kind, "shp").display(),
                "wrote shapefile"
            );
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::{Utm, WellKnownGeogCs};

    #[test]
    fn test_layer_paths() {
        let writer = ShapefileWriter::new("/out/site", "site");
        assert_eq!(
            writer.layer_path(GeometryKind::Polygon, "dbf"),
            PathBuf::from("/out/site/site_polygons.dbf")
        );
        assert_eq!(
            writer.layer_path(GeometryKind::Point, "shp"),
            PathBuf::from("/out/site/site_points.shp")
        );
    }

    #[test]
    fn test_writes_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShapefileWriter::new(dir.path(), "site");
        let srs = SpatialReference::utm(WellKnownGeogCs::Wgs84, Utm { zone: 55, north: false });

        let layer = writer.create_layer(GeometryKind::LineString, Some(&srs)).unwrap();
        writer.create_field(layer, "id", FieldType::Integer, 10).unwrap();
        writer
            .write_feature(layer, &[("id", AttributeValue::Integer(3))], "LINESTRING (0 0, 4 3)")
            .unwrap();

        let files = writer.finish().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "site_lines.shp",
                "site_lines.shx",
                "site_lines.dbf",
                "site_lines.cpg",
                "site_lines.prj"
            ]
        );

        let prj = fs::read_to_string(dir.path().join("site_lines.prj")).unwrap();
        assert!(prj.starts_with("PROJCS[\"WGS_1984_UTM_Zone_55S\""));
        assert_eq!(fs::read_to_string(dir.path().join("site_lines.cpg")).unwrap(), "UTF-8");
    }

    #[test]
    fn test_no_prj_without_srs() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShapefileWriter::new(dir.path(), "a");
        writer.create_layer(GeometryKind::Point, None).unwrap();
        let files = writer.finish().unwrap();
        assert_eq!(files.len(), 4);
        assert!(!dir.path().join("a_points.prj").exists());
    }

    #[test]
    fn test_invalid_use() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShapefileWriter::new(dir.path(), "a");
        let layer = writer.create_layer(GeometryKind::Point, None).unwrap();
        assert!(matches!(
            writer.create_layer(GeometryKind::Point, None),
            Err(ExportError::DuplicateLayer(GeometryKind::Point))
        ));
        assert!(matches!(
            writer.write_feature(LayerId(4), &[], "POINT(0 0)"),
            Err(ExportError::UnknownLayer(4))
        ));
        assert!(matches!(
            writer.write_feature(layer, &[], "LINESTRING (0 0, 1 1)"),
            Err(ExportError::GeometryMismatch { .. })
        ));
        assert!(matches!(
            writer.write_feature(layer, &[], "POINT(0"),
            Err(ExportError::Wkt(_))
        ));
        writer.finish().unwrap();
        assert!(matches!(writer.finish(), Err(ExportError::Finished)));
    }
}
