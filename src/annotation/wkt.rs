//! Well-known text output.
//!
//! Coordinates are written with the shortest representation that parses back
//! to the same `f64`; integral values drop the fractional part entirely.

use super::shape::Coord;

/// Largest magnitude for which an integral `f64` is printed through `i64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Output geometry of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// Suffix of the per-kind output layer.
    pub fn layer_suffix(self) -> &'static str {
        match self {
            GeometryKind::Point => "points",
            GeometryKind::LineString => "lines",
            GeometryKind::Polygon => "polygons",
        }
    }

    pub fn wkt_tag(self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wkt_tag())
    }
}

/// Append one coordinate value.
pub fn push_number(out: &mut String, value: f64) {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(value as i64));
    } else {
        let mut buf = ryu::Buffer::new();
        out.push_str(buf.format(value));
    }
}

fn push_coord(out: &mut String, (x, y): Coord) {
    push_number(out, x);
    out.push(' ');
    push_number(out, y);
}

fn push_sequence(out: &mut String, points: &[Coord]) {
    for (i, &p) in points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_coord(out, p);
    }
}

/// `POINT(x y)`; `POINT EMPTY` when there is no point.
pub fn point(point: Option<Coord>) -> String {
    match point {
        Some(p) => {
            let mut out = String::from("POINT(");
            push_coord(&mut out, p);
            out.push(')');
            out
        },
        None => "POINT EMPTY".to_string(),
    }
}

/// `LINESTRING (x y, ...)`
pub fn linestring(points: &[Coord]) -> String {
    if points.is_empty() {
        return "LINESTRING EMPTY".to_string();
    }
    let mut out = String::with_capacity(16 + points.len() * 24);
    out.push_str("LINESTRING (");
    push_sequence(&mut out, points);
    out.push(')');
    out
}

/// `POLYGON ((x y, ...))` with `ring` as the only boundary.
pub fn polygon(ring: &[Coord]) -> String {
    if ring.is_empty() {
        return "POLYGON EMPTY".to_string();
    }
    let mut out = String::with_capacity(16 + ring.len() * 24);
    out.push_str("POLYGON ((");
    push_sequence(&mut out, ring);
    out.push_str("))");
    out
}

/// Serialize `points` as a geometry of `kind`. Points use the first entry.
pub fn to_wkt(kind: GeometryKind, points: &[Coord]) -> String {
    match kind {
        GeometryKind::Point => point(points.first().copied()),
        GeometryKind::LineString => linestring(points),
        GeometryKind::Polygon => polygon(points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_rectangle_polygon_text() {
        let ring = [(8.0, 19.0), (8.0, 21.0), (12.0, 21.0), (12.0, 19.0), (8.0, 19.0)];
        assert_eq!(
            to_wkt(GeometryKind::Polygon, &ring),
            "POLYGON ((8 19, 8 21, 12 21, 12 19, 8 19))"
        );
    }

    #[test]
    fn test_point_and_linestring_text() {
        assert_eq!(to_wkt(GeometryKind::Point, &[(5.0, 5.0)]), "POINT(5 5)");
        assert_eq!(
            to_wkt(GeometryKind::LineString, &[(0.5, -1.25), (1e-7, 3.0)]),
            "LINESTRING (0.5 -1.25, 1e-7 3)"
        );
        assert_eq!(to_wkt(GeometryKind::Point, &[]), "POINT EMPTY");
    }

    #[test]
    fn test_full_precision_is_kept() {
        let mut out = String::new();
        push_number(&mut out, 500123.123456789);
        assert_eq!(out, "500123.123456789");

        let mut out = String::new();
        push_number(&mut out, -0.0);
        assert_eq!(out, "0");
    }

    fn parsed_points(text: &str) -> Vec<(f64, f64)> {
        let geom: wkt::Wkt<f64> = wkt::Wkt::from_str(text).unwrap();
        let geom: geo_types::Geometry<f64> = geom.try_into().unwrap();
        match geom {
            geo_types::Geometry::Point(p) => vec![(p.x(), p.y())],
            geo_types::Geometry::LineString(ls) => ls.coords().map(|c| (c.x, c.y)).collect(),
            geo_types::Geometry::Polygon(p) => {
                p.exterior().coords().map(|c| (c.x, c.y)).collect()
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_linestring_round_trips(
            points in prop::collection::vec((-1e7f64..1e7, -1e7f64..1e7), 2..20)
        ) {
            let text = linestring(&points);
            prop_assert_eq!(parsed_points(&text), points);
        }

        #[test]
        fn prop_polygon_round_trips(
            points in prop::collection::vec((-1e7f64..1e7, -1e7f64..1e7), 3..20)
        ) {
            let mut ring = points.clone();
            ring.push(points[0]);
            let text = polygon(&ring);
            prop_assert_eq!(parsed_points(&text), ring);
        }
    }
}
