//! Node types, field names and element-type ids of the annotation records.

/// Default name of the entry whose subtree holds the annotation elements.
pub const ELEMENT_LIST_NAME: &str = "ElementList";

/// Annotation element record, legacy revision (planar coordinate blocks).
pub const ELEMENT_EANT: &str = "Element_Eant";
/// Annotation element record, current revision (interleaved coordinate blocks).
pub const ELEMENT_2_EANT: &str = "Element_2_Eant";

/// Record types that describe one annotation element.
pub const ELEMENT_TYPES: &[&str] = &[ELEMENT_EANT, ELEMENT_2_EANT];

// Element record fields
pub const ELEMENT_ID_FIELD: &str = "id";
pub const ELEMENT_NAME_FIELD: &str = "name";
pub const ELEMENT_DESCRIPTION_FIELD: &str = "description";
pub const ELEMENT_TYPE_FIELD: &str = "elmType";
pub const ELEMENT_TYPE_ID_FIELD: &str = "elmTypeId";
pub const XFORM_FIELD: &str = "xformMatrix";
pub const XFORM_COEFFICIENTS_FIELD: &str = "polycoefmtx";
pub const XFORM_VECTOR_FIELD: &str = "polycoefvector";

/// Number of values in the 2x2 coefficient block.
pub const XFORM_COEFFICIENT_COUNT: usize = 4;
/// Number of values in the translation block.
pub const XFORM_VECTOR_COUNT: usize = 2;

// Shape record fields
pub const CENTER_FIELD: &str = "center";
pub const ORIGIN_FIELD: &str = "origin";
pub const ORIENTATION_FIELD: &str = "orientation";
pub const WIDTH_FIELD: &str = "width";
pub const HEIGHT_FIELD: &str = "height";
pub const SEMI_MAJOR_FIELD: &str = "semiMajorAxis";
pub const SEMI_MINOR_FIELD: &str = "semiMinorAxis";
pub const TEXT_FIELD: &str = "text.string";
pub const VERTICES_FIELD: &str = "vertices";
pub const COORDS_FIELD: &str = "coords";

// Element-type ids
pub const ELEMENT_TYPE_TEXT: i64 = 10;
pub const ELEMENT_TYPE_RECTANGLE: i64 = 12;
pub const ELEMENT_TYPE_ELLIPSE: i64 = 13;
pub const ELEMENT_TYPE_POLYGON: i64 = 15;
pub const ELEMENT_TYPE_POLYLINE: i64 = 16;

/// Full turn used when discretizing ellipses.
///
/// Annotation software writing these files uses 44/7 rather than 2π; the
/// value is kept so generated rings line up with theirs.
pub const ELLIPSE_FULL_TURN: f64 = 44.0 / 7.0;
/// Fewest segments an ellipse ring is split into.
pub const MIN_ELLIPSE_SEGMENTS: usize = 8;
/// Upper bound on ellipse segments, guarding against corrupt axis lengths.
pub const MAX_ELLIPSE_SEGMENTS: usize = 1 << 16;
