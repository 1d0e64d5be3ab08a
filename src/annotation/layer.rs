use super::collector::AnnotationCollector;
use super::config::ExtractOptions;
use super::element::Annotation;
use super::registry::{DEFAULT_REGISTRY, ShapeRegistry};
use super::wkt::GeometryKind;
use crate::common::Result;
use crate::export::{ExportSummary, VectorWriter, export_layer};
use crate::hfa::HfaFile;
use crate::srs::{self, SpatialReference};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::info;

/// All annotations of one overlay file, with its spatial reference.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayer {
    annotations: Vec<Annotation>,
    geometry_types: BTreeSet<i64>,
    srs: Option<SpatialReference>,
    skipped: usize,
}

impl AnnotationLayer {
    /// Open an overlay and collect its annotations with the default registry.
    pub fn open<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Self> {
        let file = HfaFile::open(path)?;
        Self::from_file(&file, options)
    }

    pub fn from_file(file: &HfaFile, options: &ExtractOptions) -> Result<Self> {
        Self::with_registry(file, &DEFAULT_REGISTRY, options)
    }

    /// Resolve the spatial reference and run one collection pass.
    ///
    /// An unresolvable spatial reference only leaves [`srs`](Self::srs)
    /// empty; a missing element list fails.
    pub fn with_registry(
        file: &HfaFile,
        registry: &ShapeRegistry,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let srs = srs::resolve(file);
        let collected = AnnotationCollector::new(registry, options).collect(file)?;
        info!(
            annotations = collected.annotations.len(),
            skipped = collected.skipped,
            srs = srs.as_ref().map(|s| s.to_proj4()).unwrap_or_default(),
            "read annotation layer"
        );
        Ok(Self {
            annotations: collected.annotations,
            geometry_types: collected.geometry_types,
            srs,
            skipped: collected.skipped,
        })
    }

    /// Build a layer from already decoded annotations.
    pub fn from_annotations(annotations: Vec<Annotation>, srs: Option<SpatialReference>) -> Self {
        let geometry_types = annotations.iter().map(|a| a.element_type_id()).collect();
        Self {
            annotations,
            geometry_types,
            srs,
            skipped: 0,
        }
    }

    #[inline]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Distinct element-type ids present.
    #[inline]
    pub fn geometry_types(&self) -> &BTreeSet<i64> {
        &self.geometry_types
    }

    /// Distinct output geometry kinds present.
    pub fn geometry_kinds(&self) -> BTreeSet<GeometryKind> {
        self.annotations.iter().map(|a| a.geometry_kind()).collect()
    }

    #[inline]
    pub fn srs(&self) -> Option<&SpatialReference> {
        self.srs.as_ref()
    }

    /// Replace the file-derived spatial reference.
    pub fn set_srs(&mut self, srs: SpatialReference) {
        self.srs = Some(srs);
    }

    /// Elements that were found but could not be decoded.
    #[inline]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Write the layer, one output layer per geometry kind.
    pub fn export<W: VectorWriter + ?Sized>(&self, writer: &mut W) -> Result<ExportSummary> {
        Ok(export_layer(self, writer)?)
    }
}

impl fmt::Display for AnnotationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.srs {
            Some(srs) => writeln!(f, "srs: {}", srs)?,
            None => writeln!(f, "srs: <none>")?,
        }
        let types: Vec<String> = self.geometry_types.iter().map(|t| t.to_string()).collect();
        writeln!(f, "geometry types: {}", types.join(", "))?;
        writeln!(f, "annotations: {}", self.annotations.len())?;
        for annotation in &self.annotations {
            writeln!(f)?;
            write!(f, "{}", annotation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::fixture::{OvrBuilder, ShapeSpec};
    use crate::common::Error;
    use crate::srs::{Utm, WellKnownGeogCs};

    fn sample() -> HfaFile {
        let mut b = OvrBuilder::new();
        b.map_info((500000.0, 6000000.0), "meters")
            .projection(1, 55, false, "WGS 84");
        b.element(1, "Lake", 10, ShapeSpec::text((5.0, 5.0), "Lake"));
        b.element(2, "Field", 12, ShapeSpec::rectangle((10.0, 20.0), 4.0, 2.0, 0.0));
        b.element(3, "Track", 16, ShapeSpec::polyline(&[(0.0, 0.0), (4.0, 3.0)]));
        b.element(4, "Pond", 13, ShapeSpec::ellipse((0.0, 0.0), 5.0, 3.0, 0.0));
        b.build()
    }

    #[test]
    fn test_layer_contents() {
        let layer = AnnotationLayer::from_file(&sample(), &ExtractOptions::default()).unwrap();
        assert_eq!(layer.len(), 4);
        assert_eq!(
            layer.geometry_types().iter().copied().collect::<Vec<_>>(),
            [10, 12, 13, 16]
        );
        assert_eq!(
            layer.geometry_kinds().into_iter().collect::<Vec<_>>(),
            [GeometryKind::Point, GeometryKind::LineString, GeometryKind::Polygon]
        );
        assert_eq!(
            layer.srs(),
            Some(&SpatialReference::utm(
                WellKnownGeogCs::Wgs84,
                Utm { zone: 55, north: false }
            ))
        );
    }

    #[test]
    fn test_srs_override() {
        let mut layer = AnnotationLayer::from_file(&sample(), &ExtractOptions::default()).unwrap();
        let custom = SpatialReference::from_proj4("+proj=utm +zone=56 +south +datum=WGS84").unwrap();
        layer.set_srs(custom.clone());
        assert_eq!(layer.srs(), Some(&custom));
    }

    #[test]
    fn test_missing_srs_is_not_fatal() {
        let mut b = OvrBuilder::new();
        b.element(1, "Lake", 10, ShapeSpec::text((5.0, 5.0), "Lake"));
        let layer = AnnotationLayer::from_file(&b.build(), &ExtractOptions::default()).unwrap();
        assert_eq!(layer.srs(), None);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_custom_element_list_name() {
        let file = sample();
        let options = ExtractOptions::new().with_element_list("Annotations");
        assert!(matches!(
            AnnotationLayer::from_file(&file, &options),
            Err(Error::MissingElementList(_))
        ));
    }

    #[test]
    fn test_display() {
        let layer = AnnotationLayer::from_file(&sample(), &ExtractOptions::default()).unwrap();
        let shown = layer.to_string();
        assert!(shown.starts_with("srs: +proj=utm +zone=55 +south"));
        assert!(shown.contains("annotations: 4"));
        assert!(shown.contains("POLYGON ((8 19, 8 21, 12 21, 12 19, 8 19))"));
    }
}
