use super::shape::Coord;
use serde::Serialize;
use std::fmt;

/// Per-annotation affine map from local shape space into map space.
///
/// ```text
/// x' = x * c0 + y * c2 + t0
/// y' = x * c1 + y * c3 + t1
/// ```
///
/// `Default` is all zeros, which is what an element with an unreadable
/// transform block ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AffineTransform {
    /// 2x2 linear part, stored column-major as `[c0, c1, c2, c3]`.
    pub coefficients: [f64; 4],
    /// Translation `[t0, t1]`.
    pub translation: [f64; 2],
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        coefficients: [1.0, 0.0, 0.0, 1.0],
        translation: [0.0, 0.0],
    };

    pub fn new(coefficients: [f64; 4], translation: [f64; 2]) -> Self {
        Self {
            coefficients,
            translation,
        }
    }

    #[inline]
    pub fn apply(&self, (x, y): Coord) -> Coord {
        let [c0, c1, c2, c3] = self.coefficients;
        let [t0, t1] = self.translation;
        (x * c0 + y * c2 + t0, x * c1 + y * c3 + t1)
    }

    pub fn apply_all(&self, points: &[Coord]) -> Vec<Coord> {
        points.iter().map(|&p| self.apply(p)).collect()
    }

    /// The six values in storage order: coefficients, then translation.
    pub fn to_array(&self) -> [f64; 6] {
        let [c0, c1, c2, c3] = self.coefficients;
        let [t0, t1] = self.translation;
        [c0, c1, c2, c3, t0, t1]
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.to_array();
        for row in v.chunks_exact(2) {
            writeln!(f, "\t{} {}", row[0], row[1])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_apply_scale_and_shift() {
        let t = AffineTransform::new([2.0, 0.0, 0.0, 3.0], [100.0, -50.0]);
        assert_eq!(t.apply((1.0, 1.0)), (102.0, -47.0));
    }

    #[test]
    fn test_coefficient_order() {
        // c2 feeds y into x', c1 feeds x into y'.
        let t = AffineTransform::new([0.0, 1.0, 1.0, 0.0], [0.0, 0.0]);
        assert_eq!(t.apply((3.0, 7.0)), (7.0, 3.0));
    }

    #[test]
    fn test_default_collapses_to_origin() {
        let t = AffineTransform::default();
        assert_eq!(t.apply((12.5, -3.0)), (0.0, 0.0));
        assert_eq!(t.to_array(), [0.0; 6]);
    }

    proptest! {
        #[test]
        fn prop_identity_is_exact(x in -1e12f64..1e12, y in -1e12f64..1e12) {
            prop_assert_eq!(AffineTransform::IDENTITY.apply((x, y)), (x, y));
        }
    }
}
