//! Shape records and their local-space geometry.
//!
//! Every annotation element owns exactly one shape child. The shape holds
//! geometry in the element's own coordinate space; the element's affine
//! transform later moves it into map space. Closed shapes (rectangles and
//! ellipses) are stored parametrically and expanded into rings here, rotated
//! about their own center by their `orientation`.

use super::consts::*;
use super::error::{AnnotationError, AnnotationResult};
use crate::hfa::{HfaError, HfaResult, NodeData, PairLayout};
use phf::phf_map;
use serde::Serialize;
use std::fmt;

/// An `(x, y)` coordinate pair.
pub type Coord = (f64, f64);

/// Supported shape record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ShapeKind {
    Ellipse,
    Rectangle,
    Polyline,
    Polygon,
    Text,
    Point,
}

/// Decoder for one shape record type.
pub type ShapeDecoder = fn(&NodeData<'_>, PairLayout) -> AnnotationResult<ShapeGeometry>;

/// Shape node type name to shape kind.
static SHAPE_NODE_TYPES: phf::Map<&'static str, ShapeKind> = phf_map! {
    "Eant_Ellipse" => ShapeKind::Ellipse,
    "Eant_Rectangle" => ShapeKind::Rectangle,
    "Rectangle2" => ShapeKind::Rectangle,
    "Eant_Polyline" => ShapeKind::Polyline,
    "Eant_Polygon" => ShapeKind::Polygon,
    "Eant_Text" => ShapeKind::Text,
    "Text2" => ShapeKind::Text,
    "Eant_Point" => ShapeKind::Point,
};

impl ShapeKind {
    /// Look up the kind of a shape node type, `None` for anything else.
    pub fn from_node_type(type_name: &str) -> Option<Self> {
        SHAPE_NODE_TYPES.get(type_name).copied()
    }

    pub fn decoder(self) -> ShapeDecoder {
        match self {
            ShapeKind::Ellipse => decode_ellipse,
            ShapeKind::Rectangle => decode_rectangle,
            ShapeKind::Polyline => decode_polyline,
            ShapeKind::Polygon => decode_polygon,
            ShapeKind::Text => decode_text,
            ShapeKind::Point => decode_point,
        }
    }

    /// Decode a loaded shape node of this kind.
    pub fn decode(self, data: &NodeData<'_>, layout: PairLayout) -> AnnotationResult<ShapeGeometry> {
        (self.decoder())(data, layout)
    }
}

fn decode_ellipse(data: &NodeData<'_>, _: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Ellipse::decode(data).map(ShapeGeometry::Ellipse)
}

fn decode_rectangle(data: &NodeData<'_>, _: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Rectangle::decode(data).map(ShapeGeometry::Rectangle)
}

fn decode_polyline(data: &NodeData<'_>, layout: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Polyline::decode(data, layout).map(ShapeGeometry::Polyline)
}

fn decode_polygon(data: &NodeData<'_>, layout: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Polygon::decode(data, layout).map(ShapeGeometry::Polygon)
}

fn decode_text(data: &NodeData<'_>, _: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Text::decode(data).map(ShapeGeometry::Text)
}

fn decode_point(data: &NodeData<'_>, _: PairLayout) -> AnnotationResult<ShapeGeometry> {
    Point::decode(data).map(ShapeGeometry::Point)
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Text => "text",
            ShapeKind::Point => "point",
        };
        f.write_str(name)
    }
}

/// Rotate `points` counter-clockwise by `angle` radians about `center`.
pub fn rotate(points: &[Coord], center: Coord, angle: f64) -> Vec<Coord> {
    if angle == 0.0 {
        return points.to_vec();
    }
    let (sin, cos) = angle.sin_cos();
    let (cx, cy) = center;
    points
        .iter()
        .map(|&(x, y)| {
            let (dx, dy) = (x - cx, y - cy);
            (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
        })
        .collect()
}

fn number(data: &NodeData<'_>, path: &str) -> HfaResult<Option<f64>> {
    Ok(data.field(path)?.and_then(|v| v.as_f64()))
}

/// Read an `Eprj_Coordinate`-like `{x, y}` object from the first of `fields`
/// the record declares.
fn read_xy(data: &NodeData<'_>, fields: &[&str]) -> HfaResult<Coord> {
    for field in fields {
        let x = number(data, &format!("{}.x", field))?;
        let y = number(data, &format!("{}.y", field))?;
        if let (Some(x), Some(y)) = (x, y) {
            return Ok((x, y));
        }
    }
    Err(HfaError::FieldNotFound {
        type_name: data.type_def().name().to_string(),
        field: fields.join("|"),
    })
}

fn orientation(data: &NodeData<'_>) -> HfaResult<f64> {
    Ok(number(data, ORIENTATION_FIELD)?.unwrap_or(0.0))
}

/// Ellipse given by its center, semi-axes and rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ellipse {
    pub center: Coord,
    pub semi_major: f64,
    pub semi_minor: f64,
    pub orientation: f64,
}

impl Ellipse {
    pub fn decode(data: &NodeData<'_>) -> AnnotationResult<Self> {
        Ok(Self {
            center: read_xy(data, &[CENTER_FIELD, ORIGIN_FIELD])?,
            semi_major: data.get_double_field(SEMI_MAJOR_FIELD)?,
            semi_minor: data.get_double_field(SEMI_MINOR_FIELD)?,
            orientation: orientation(data)?,
        })
    }

    /// Number of segments the boundary is split into: `floor(sqrt(20 * mean
    /// axis))`, clamped to at least `MIN_ELLIPSE_SEGMENTS` (8) and at most
    /// `MAX_ELLIPSE_SEGMENTS` (65536) so huge or corrupt axes cannot
    /// allocate without bound.
    pub fn segments(&self) -> usize {
        let mean = (self.semi_major + self.semi_minor) / 2.0;
        // NaN and negative radicands saturate to 0 and fall back to the minimum.
        let n = (mean * 20.0).sqrt().floor() as usize;
        n.clamp(MIN_ELLIPSE_SEGMENTS, MAX_ELLIPSE_SEGMENTS)
    }

    fn unrotated_points(&self) -> Vec<Coord> {
        let (cx, cy) = self.center;
        let n = self.segments();
        let step = ELLIPSE_FULL_TURN / n as f64;
        let mut ring: Vec<Coord> = (0..n)
            .map(|i| {
                let theta = i as f64 * step;
                (
                    cx + self.semi_major * theta.cos(),
                    cy + self.semi_minor * theta.sin(),
                )
            })
            .collect();
        ring.push(ring[0]);
        ring
    }

    pub fn points(&self) -> Vec<Coord> {
        rotate(&self.unrotated_points(), self.center, self.orientation)
    }
}

/// Axis-aligned rectangle before rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rectangle {
    pub center: Coord,
    pub width: f64,
    pub height: f64,
    pub orientation: f64,
}

impl Rectangle {
    pub fn decode(data: &NodeData<'_>) -> AnnotationResult<Self> {
        Ok(Self {
            center: read_xy(data, &[CENTER_FIELD, ORIGIN_FIELD])?,
            width: data.get_double_field(WIDTH_FIELD)?,
            height: data.get_double_field(HEIGHT_FIELD)?,
            orientation: orientation(data)?,
        })
    }

    fn unrotated_points(&self) -> Vec<Coord> {
        let (cx, cy) = self.center;
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        vec![
            (cx - hw, cy - hh),
            (cx - hw, cy + hh),
            (cx + hw, cy + hh),
            (cx + hw, cy - hh),
            (cx - hw, cy - hh),
        ]
    }

    pub fn points(&self) -> Vec<Coord> {
        rotate(&self.unrotated_points(), self.center, self.orientation)
    }
}

/// Read the vertex matrix nested at `vertices.coords`.
fn read_vertices(data: &NodeData<'_>, layout: PairLayout) -> HfaResult<Vec<Coord>> {
    let mut cursor = data.cursor();
    let missing = || HfaError::FieldNotFound {
        type_name: data.type_def().name().to_string(),
        field: format!("{}.{}", VERTICES_FIELD, COORDS_FIELD),
    };

    let vertices = cursor.seek(VERTICES_FIELD)?.ok_or_else(missing)?;
    let Some(mut inner) = vertices.object_cursor(0)? else {
        return Ok(Vec::new());
    };
    let coords = inner.seek(COORDS_FIELD)?.ok_or_else(missing)?;
    coords.matrix()?.pairs(layout)
}

/// Open vertex sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub vertices: Vec<Coord>,
}

impl Polyline {
    pub fn decode(data: &NodeData<'_>, layout: PairLayout) -> AnnotationResult<Self> {
        let vertices = read_vertices(data, layout)?;
        if vertices.len() < 2 {
            return Err(AnnotationError::TooFewVertices {
                found: vertices.len(),
                required: 2,
            });
        }
        Ok(Self { vertices })
    }

    pub fn points(&self) -> Vec<Coord> {
        self.vertices.clone()
    }
}

/// Polygon ring; the stored vertices are not closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    pub vertices: Vec<Coord>,
}

impl Polygon {
    pub fn decode(data: &NodeData<'_>, layout: PairLayout) -> AnnotationResult<Self> {
        let vertices = read_vertices(data, layout)?;
        if vertices.len() < 3 {
            return Err(AnnotationError::TooFewVertices {
                found: vertices.len(),
                required: 3,
            });
        }
        Ok(Self { vertices })
    }

    /// The ring, closed by repeating the first vertex.
    pub fn points(&self) -> Vec<Coord> {
        let mut ring = self.vertices.clone();
        ring.push(self.vertices[0]);
        ring
    }
}

/// Text label anchored at its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub origin: Coord,
    pub text: String,
}

impl Text {
    pub fn decode(data: &NodeData<'_>) -> AnnotationResult<Self> {
        let origin = read_xy(data, &[ORIGIN_FIELD, CENTER_FIELD])?;
        let text = match data.find_string_field(TEXT_FIELD)? {
            Some(text) => text,
            None => data.find_string_field("text")?.unwrap_or_default(),
        };
        Ok(Self { origin, text })
    }
}

/// Bare point marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub position: Coord,
}

impl Point {
    pub fn decode(data: &NodeData<'_>) -> AnnotationResult<Self> {
        Ok(Self {
            position: read_xy(data, &[CENTER_FIELD, ORIGIN_FIELD])?,
        })
    }
}

/// Decoded shape in local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeGeometry {
    Ellipse(Ellipse),
    Rectangle(Rectangle),
    Polyline(Polyline),
    Polygon(Polygon),
    Text(Text),
    Point(Point),
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Ellipse(_) => ShapeKind::Ellipse,
            ShapeGeometry::Rectangle(_) => ShapeKind::Rectangle,
            ShapeGeometry::Polyline(_) => ShapeKind::Polyline,
            ShapeGeometry::Polygon(_) => ShapeKind::Polygon,
            ShapeGeometry::Text(_) => ShapeKind::Text,
            ShapeGeometry::Point(_) => ShapeKind::Point,
        }
    }

    /// Local-space points: a closed ring for ellipses, rectangles and
    /// polygons, the vertex list for polylines, one point otherwise.
    pub fn points(&self) -> Vec<Coord> {
        match self {
            ShapeGeometry::Ellipse(e) => e.points(),
            ShapeGeometry::Rectangle(r) => r.points(),
            ShapeGeometry::Polyline(p) => p.points(),
            ShapeGeometry::Polygon(p) => p.points(),
            ShapeGeometry::Text(t) => vec![t.origin],
            ShapeGeometry::Point(p) => vec![p.position],
        }
    }

    /// Label string of text shapes.
    pub fn text(&self) -> Option<&str> {
        match self {
            ShapeGeometry::Text(t) => Some(&t.text),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeGeometry::Ellipse(e) => {
                writeln!(f, "center: {}, {}", e.center.0, e.center.1)?;
                writeln!(f, "rotation: {}", e.orientation)?;
                writeln!(f, "majx: {}", e.semi_major)?;
                writeln!(f, "minx: {}", e.semi_minor)
            },
            ShapeGeometry::Rectangle(r) => {
                writeln!(f, "center: {}, {}", r.center.0, r.center.1)?;
                writeln!(f, "rotation: {}", r.orientation)?;
                writeln!(f, "width: {}", r.width)?;
                writeln!(f, "height: {}", r.height)
            },
            ShapeGeometry::Polyline(p) => writeln!(f, "vertices: {}", p.vertices.len()),
            ShapeGeometry::Polygon(p) => writeln!(f, "vertices: {}", p.vertices.len()),
            ShapeGeometry::Text(t) => {
                writeln!(f, "origin: {}, {}", t.origin.0, t.origin.1)?;
                writeln!(f, "textval: {}", t.text)
            },
            ShapeGeometry::Point(p) => writeln!(f, "position: {}, {}", p.position.0, p.position.1),
        }
    }
}
