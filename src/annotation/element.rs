use super::consts::*;
use super::error::{AnnotationError, AnnotationResult};
use super::registry::ShapeRegistry;
use super::shape::{Coord, ShapeGeometry};
use super::transform::AffineTransform;
use super::wkt::{self, GeometryKind};
use crate::hfa::{FieldCursor, HfaResult, NodeData, PairLayout};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// One decoded annotation element with its shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    id: i64,
    name: Option<String>,
    description: Option<String>,
    element_type: Option<String>,
    element_type_id: i64,
    shape: ShapeGeometry,
    transform: AffineTransform,
}

impl Annotation {
    /// Decode an element record and its already-loaded shape child.
    pub fn decode(
        element: &NodeData<'_>,
        shape: &NodeData<'_>,
        registry: &ShapeRegistry,
        layout: PairLayout,
    ) -> AnnotationResult<Self> {
        let element_type_id = element.get_int_field(ELEMENT_TYPE_ID_FIELD)?;
        let shape = registry.build(element_type_id, shape, layout)?;

        let annotation = Self {
            id: element.get_int_field(ELEMENT_ID_FIELD)?,
            name: element.find_string_field(ELEMENT_NAME_FIELD)?,
            description: element.find_string_field(ELEMENT_DESCRIPTION_FIELD)?,
            element_type: element.find_string_field(ELEMENT_TYPE_FIELD)?,
            element_type_id,
            shape,
            transform: decode_transform(element),
        };
        annotation.check_finite()?;
        Ok(annotation)
    }

    /// WKT has no spelling for NaN or infinity, so such shapes are rejected.
    fn check_finite(&self) -> AnnotationResult<()> {
        let local = self.shape.points();
        let mapped = self.transform.apply_all(&local);
        match local
            .iter()
            .chain(mapped.iter())
            .find(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            Some(&(x, y)) => Err(AnnotationError::NonFinite { x, y }),
            None => Ok(()),
        }
    }

    pub fn new(
        id: i64,
        name: Option<String>,
        element_type_id: i64,
        shape: ShapeGeometry,
        transform: AffineTransform,
    ) -> Self {
        Self {
            id,
            name,
            description: None,
            element_type: None,
            element_type_id,
            shape,
            transform,
        }
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Element type label as stored in the record (e.g. `Rectangle`).
    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    #[inline]
    pub fn element_type_id(&self) -> i64 {
        self.element_type_id
    }

    #[inline]
    pub fn shape(&self) -> &ShapeGeometry {
        &self.shape
    }

    #[inline]
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    /// Label of text annotations.
    pub fn text(&self) -> Option<&str> {
        self.shape.text()
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        match self.element_type_id {
            ELEMENT_TYPE_TEXT => GeometryKind::Point,
            ELEMENT_TYPE_POLYLINE => GeometryKind::LineString,
            _ => GeometryKind::Polygon,
        }
    }

    /// Shape points moved into map space.
    pub fn points(&self) -> Vec<Coord> {
        self.transform.apply_all(&self.shape.points())
    }

    pub fn to_wkt(&self) -> String {
        wkt::to_wkt(self.geometry_kind(), &self.points())
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id: {}", self.id)?;
        writeln!(
            f,
            "type: {} [{}]",
            self.element_type().unwrap_or(""),
            self.element_type_id
        )?;
        writeln!(f, "name: {}", self.name().unwrap_or(""))?;
        writeln!(f, "description: {}", self.description().unwrap_or(""))?;
        writeln!(f, "xform:")?;
        write!(f, "{}", self.transform)?;
        writeln!(f)?;
        write!(f, "{}", self.shape)?;
        writeln!(f, "{}", self.to_wkt())
    }
}

/// Read one basedata sub-block of the transform, starting from a copy of
/// the cursor at the start of the polynomial record.
fn read_block(start: &FieldCursor<'_>, field: &str) -> HfaResult<Option<Vec<f64>>> {
    let mut cursor = start.clone();
    match cursor.seek(field)? {
        Some(span) => Ok(Some(span.matrix()?.into_values())),
        None => Ok(None),
    }
}

fn decode_transform(element: &NodeData<'_>) -> AffineTransform {
    let node = element.node();
    let mut transform = AffineTransform::default();

    let start = element
        .cursor()
        .seek(XFORM_FIELD)
        .and_then(|span| match span {
            Some(span) => span.object_cursor(0),
            None => Ok(None),
        });
    let start = match start {
        Ok(Some(start)) => start,
        Ok(None) => {
            warn!(node = node.name(), "element has no transform, using zeros");
            return transform;
        },
        Err(e) => {
            warn!(node = node.name(), error = %e, "unreadable transform, using zeros");
            return transform;
        },
    };

    match read_block(&start, XFORM_COEFFICIENTS_FIELD) {
        Ok(Some(values)) if values.len() == XFORM_COEFFICIENT_COUNT => {
            transform.coefficients.copy_from_slice(&values);
        },
        Ok(found) => warn!(
            node = node.name(),
            found = found.map_or(0, |v| v.len()),
            expected = XFORM_COEFFICIENT_COUNT,
            "transform coefficient block has the wrong length"
        ),
        Err(e) => warn!(node = node.name(), error = %e, "unreadable transform coefficients"),
    }

    match read_block(&start, XFORM_VECTOR_FIELD) {
        Ok(Some(values)) if values.len() == XFORM_VECTOR_COUNT => {
            transform.translation.copy_from_slice(&values);
        },
        Ok(found) => warn!(
            node = node.name(),
            found = found.map_or(0, |v| v.len()),
            expected = XFORM_VECTOR_COUNT,
            "transform vector block has the wrong length"
        ),
        Err(e) => warn!(node = node.name(), error = %e, "unreadable transform vector"),
    }

    transform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::fixture::{ElementSpec, OvrBuilder, ShapeSpec};
    use crate::hfa::HfaFile;

    fn decode(file: &HfaFile, element: &str) -> Annotation {
        let node = file.find(element).unwrap();
        let shape = node.children().next().unwrap();
        Annotation::decode(
            &node.load_data().unwrap(),
            &shape.load_data().unwrap(),
            &ShapeRegistry::standard(),
            PairLayout::Interleaved,
        )
        .unwrap()
    }

    #[test]
    fn test_rectangle_scenario() {
        let mut b = OvrBuilder::new();
        b.element(7, "Field", 12, ShapeSpec::rectangle((10.0, 20.0), 4.0, 2.0, 0.0));
        let file = b.build();
        let a = decode(&file, "Field");

        assert_eq!(a.id(), 7);
        assert_eq!(a.name(), Some("Field"));
        assert_eq!(a.element_type(), Some("Rectangle"));
        assert_eq!(a.geometry_kind(), GeometryKind::Polygon);
        assert_eq!(a.transform(), &AffineTransform::IDENTITY);
        assert_eq!(a.to_wkt(), "POLYGON ((8 19, 8 21, 12 21, 12 19, 8 19))");
    }

    #[test]
    fn test_text_scenario() {
        let mut b = OvrBuilder::new();
        b.element(1, "Label", 10, ShapeSpec::text((5.0, 5.0), "Lake"));
        let file = b.build();
        let a = decode(&file, "Label");

        assert_eq!(a.to_wkt(), "POINT(5 5)");
        assert_eq!(a.text(), Some("Lake"));
        assert_eq!(a.geometry_kind(), GeometryKind::Point);
    }

    #[test]
    fn test_identity_transform_keeps_local_points() {
        let mut b = OvrBuilder::new();
        b.element(1, "Oval", 13, ShapeSpec::ellipse((3.5, -2.0), 7.25, 1.5, 0.3));
        let file = b.build();
        let a = decode(&file, "Oval");
        assert_eq!(a.points(), a.shape().points());
    }

    #[test]
    fn test_transform_is_applied_after_shape_rotation() {
        let mut b = OvrBuilder::new();
        let spec = ElementSpec::new(3, "Moved", 16)
            .with_description("shifted road")
            .with_transform(&[2.0, 0.0, 0.0, 2.0], &[1000.0, 5000.0]);
        let list = b.list();
        b.add_element(
            list,
            &spec,
            vec![ShapeSpec::polyline(&[(0.0, 0.0), (1.0, 2.0)])],
        );
        let file = b.build();
        let a = decode(&file, "Moved");

        assert_eq!(a.description(), Some("shifted road"));
        assert_eq!(a.transform().to_array(), [2.0, 0.0, 0.0, 2.0, 1000.0, 5000.0]);
        assert_eq!(a.points(), vec![(1000.0, 5000.0), (1002.0, 5004.0)]);
        assert_eq!(a.to_wkt(), "LINESTRING (1000 5000, 1002 5004)");
    }

    #[test]
    fn test_malformed_coefficients_fall_back_to_zero() {
        let mut b = OvrBuilder::new();
        let spec = ElementSpec::new(4, "Bent", 12).with_transform(&[1.0, 0.0, 0.0], &[10.0, 20.0]);
        let list = b.list();
        b.add_element(
            list,
            &spec,
            vec![ShapeSpec::rectangle((0.0, 0.0), 2.0, 2.0, 0.0)],
        );
        let file = b.build();
        let a = decode(&file, "Bent");

        // The vector block is still read independently of the bad coefficients.
        assert_eq!(a.transform().coefficients, [0.0; 4]);
        assert_eq!(a.transform().translation, [10.0, 20.0]);
        assert!(a.points().iter().all(|&p| p == (10.0, 20.0)));
    }

    #[test]
    fn test_non_finite_transform_is_rejected() {
        let mut b = OvrBuilder::new();
        let spec = ElementSpec::new(5, "Far", 12)
            .with_transform(&[f64::INFINITY, 0.0, 0.0, 1.0], &[0.0, 0.0]);
        let list = b.list();
        b.add_element(
            list,
            &spec,
            vec![ShapeSpec::rectangle((1.0, 1.0), 2.0, 2.0, 0.0)],
        );
        let file = b.build();
        let node = file.find("Far").unwrap();
        let shape = node.children().next().unwrap();
        let result = Annotation::decode(
            &node.load_data().unwrap(),
            &shape.load_data().unwrap(),
            &ShapeRegistry::standard(),
            PairLayout::Interleaved,
        );
        assert!(matches!(result, Err(AnnotationError::NonFinite { .. })));
    }

    #[test]
    fn test_wkt_parses_back_to_mapped_points() {
        let mut b = OvrBuilder::new();
        b.element(1, "Tilted", 12, ShapeSpec::rectangle((10.0, 20.0), 4.0, 2.0, 0.7));
        let spec = ElementSpec::new(2, "Skewed", 13)
            .with_transform(&[0.5, 0.25, -0.1, 2.0], &[500000.0, 6000000.0]);
        let list = b.list();
        b.add_element(
            list,
            &spec,
            vec![ShapeSpec::ellipse((3.0, -4.0), 12.5, 3.25, 1.1)],
        );
        let file = b.build();

        for name in ["Tilted", "Skewed"] {
            let a = decode(&file, name);
            let parsed: ::wkt::Wkt<f64> = std::str::FromStr::from_str(&a.to_wkt()).unwrap();
            let parsed: geo_types::Geometry<f64> = parsed.try_into().unwrap();
            let geo_types::Geometry::Polygon(polygon) = parsed else {
                panic!("{} is not a polygon", name);
            };
            let expected = a.points();
            let found: Vec<_> = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();
            assert_eq!(found.len(), expected.len(), "{}", name);
            for (f, e) in found.iter().zip(&expected) {
                assert!((f.0 - e.0).abs() < 1e-6 && (f.1 - e.1).abs() < 1e-6, "{}: {:?} != {:?}", name, f, e);
            }
        }
    }

    #[test]
    fn test_display_lists_metadata() {
        let mut b = OvrBuilder::new();
        b.element(1, "Label", 10, ShapeSpec::text((5.0, 5.0), "Lake"));
        let file = b.build();
        let shown = decode(&file, "Label").to_string();
        assert!(shown.contains("type: Text [10]"));
        assert!(shown.contains("textval: Lake"));
        assert!(shown.ends_with("POINT(5 5)\n"));
    }
}
