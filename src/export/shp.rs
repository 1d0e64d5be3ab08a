//! Shape (.shp) and index (.shx) file generation
//!
//! Main file header and record headers are big-endian; everything inside a
//! record and the rest of the header is little-endian.

use super::{ExportError, ExportResult, geometry_name};
use crate::annotation::{Coord, GeometryKind};
use bytes::BufMut;
use geo_types::{Geometry, LineString};
use std::io;

/// File code at offset 0
pub(crate) const FILE_CODE: i32 = 9994;
pub(crate) const VERSION: i32 = 1000;
/// Main file and index header size
pub(crate) const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;
const INDEX_RECORD_LEN: usize = 8;

pub(crate) const SHAPE_POINT: i32 = 1;
pub(crate) const SHAPE_POLYLINE: i32 = 3;
pub(crate) const SHAPE_POLYGON: i32 = 5;

pub(crate) fn shape_type(kind: GeometryKind) -> i32 {
    match kind {
        GeometryKind::Point => SHAPE_POINT,
        GeometryKind::LineString => SHAPE_POLYLINE,
        GeometryKind::Polygon => SHAPE_POLYGON,
    }
}

/// Bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    const ZERO: Extent = Extent {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    fn of<'a, I: IntoIterator<Item = &'a Coord>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc, &(x, y)| {
            let point = Extent {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            };
            Some(match acc {
                Some(e) => e.union(point),
                None => point,
            })
        })
    }

    fn union(self, other: Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_f64_le(self.min_x);
        buf.put_f64_le(self.min_y);
        buf.put_f64_le(self.max_x);
        buf.put_f64_le(self.max_y);
    }
}

/// Twice the signed area; positive for counter-clockwise rings.
fn signed_area2(ring: &[Coord]) -> f64 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(&(x0, y0), &(x1, y1))| x0 * y1 - x1 * y0)
        .sum()
}

fn ring(line: &LineString<f64>, clockwise: bool) -> Vec<Coord> {
    let mut points: Vec<Coord> = line.coords().map(|c| (c.x, c.y)).collect();
    let area = signed_area2(&points);
    if (clockwise && area > 0.0) || (!clockwise && area < 0.0) {
        points.reverse();
    }
    points
}

fn polygon_parts(polygon: &geo_types::Polygon<f64>, parts: &mut Vec<Vec<Coord>>) {
    // Outer rings clockwise, holes counter-clockwise
    parts.push(ring(polygon.exterior(), true));
    parts.extend(polygon.interiors().iter().map(|hole| ring(hole, false)));
}

/// One record's geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShpShape {
    Point(Coord),
    /// PolyLine or Polygon
    Parts {
        shape_type: i32,
        parts: Vec<Vec<Coord>>,
    },
}

impl ShpShape {
    /// Convert a parsed geometry for a layer of `kind`.
    pub(crate) fn from_geometry(kind: GeometryKind, geometry: &Geometry<f64>) -> ExportResult<Self> {
        let mut parts = Vec::new();
        match (kind, geometry) {
            (GeometryKind::Point, Geometry::Point(p)) => return Ok(ShpShape::Point((p.x(), p.y()))),
            (GeometryKind::LineString, Geometry::LineString(line)) => {
                parts.push(line.coords().map(|c| (c.x, c.y)).collect());
            },
            (GeometryKind::LineString, Geometry::MultiLineString(lines)) => {
                for line in lines {
                    parts.push(line.coords().map(|c| (c.x, c.y)).collect());
                }
            },
            (GeometryKind::Polygon, Geometry::Polygon(polygon)) => polygon_parts(polygon, &mut parts),
            (GeometryKind::Polygon, Geometry::MultiPolygon(polygons)) => {
                for polygon in polygons {
                    polygon_parts(polygon, &mut parts);
                }
            },
            (expected, other) => {
                return Err(ExportError::GeometryMismatch {
                    expected,
                    found: geometry_name(other),
                });
            },
        }
        Ok(ShpShape::Parts {
            shape_type: shape_type(kind),
            parts,
        })
    }

    pub(crate) fn extent(&self) -> Option<Extent> {
        match self {
            ShpShape::Point(p) => Extent::of(std::iter::once(p)),
            ShpShape::Parts { parts, .. } => Extent::of(parts.iter().flatten()),
        }
    }

    /// Record content, without the record header.
    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            ShpShape::Point((x, y)) => {
                let mut buf = Vec::with_capacity(20);
                buf.put_i32_le(SHAPE_POINT);
                buf.put_f64_le(*x);
                buf.put_f64_le(*y);
                buf
            },
            ShpShape::Parts { shape_type, parts } => {
                let num_points: usize = parts.iter().map(Vec::len).sum();
                let mut buf = Vec::with_capacity(44 + 4 * parts.len() + 16 * num_points);
                buf.put_i32_le(*shape_type);
                self.extent().unwrap_or(Extent::ZERO).put(&mut buf);
                buf.put_i32_le(parts.len() as i32);
                buf.put_i32_le(num_points as i32);
                let mut start = 0;
                for part in parts {
                    buf.put_i32_le(start as i32);
                    start += part.len();
                }
                for &(x, y) in parts.iter().flatten() {
                    buf.put_f64_le(x);
                    buf.put_f64_le(y);
                }
                buf
            },
        }
    }
}

/// Shape and index file builder for one layer
pub(crate) struct ShapeFileBuilder {
    /// Shape type shared by all records
    shape_type: i32,
    /// Encoded record contents
    records: Vec<Vec<u8>>,
    /// Union of record extents
    extent: Option<Extent>,
}

impl ShapeFileBuilder {
    pub(crate) fn new(shape_type: i32) -> Self {
        Self {
            shape_type,
            records: Vec::new(),
            extent: None,
        }
    }

    pub(crate) fn add(&mut self, shape: &ShpShape) {
        if let Some(e) = shape.extent() {
            self.extent = Some(match self.extent {
                Some(current) => current.union(e),
                None => e,
            });
        }
        self.records.push(shape.encode());
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    fn header(&self, file_len: usize) -> io::Result<Vec<u8>> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.put_i32(FILE_CODE);
        header.put_bytes(0, 20);
        header.put_i32(words(file_len)?);
        header.put_i32_le(VERSION);
        header.put_i32_le(self.shape_type);
        self.extent.unwrap_or(Extent::ZERO).put(&mut header);
        // Z and M ranges
        header.put_bytes(0, 32);
        Ok(header)
    }

    /// Generate the main file and its index.
    pub(crate) fn generate(&self) -> io::Result<(Vec<u8>, Vec<u8>)> {
        let content_len: usize = self.records.iter().map(|r| RECORD_HEADER_LEN + r.len()).sum();
        let index_len = HEADER_LEN + INDEX_RECORD_LEN * self.records.len();

        let mut shp = self.header(HEADER_LEN + content_len)?;
        let mut shx = self.header(index_len)?;
        shp.reserve(content_len);
        shx.reserve(index_len - HEADER_LEN);

        for (i, record) in self.records.iter().enumerate() {
            let offset = words(shp.len())?;
            let len = words(record.len())?;

            shp.put_i32(i as i32 + 1);
            shp.put_i32(len);
            shp.extend_from_slice(record);

            shx.put_i32(offset);
            shx.put_i32(len);
        }
        Ok((shp, shx))
    }
}

/// Byte length in 16-bit words.
fn words(len: usize) -> io::Result<i32> {
    i32::try_from(len / 2).map_err(|_| io::Error::other("shapefile exceeds the 4 GiB format limit"))
}
