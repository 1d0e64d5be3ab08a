//! Synthetic overlay images for the annotation and conversion tests.

use crate::hfa::HfaFile;
use crate::hfa::fixture::{DataWriter, HfaBuilder};

/// A cut-down dictionary covering the annotation and map-info records.
pub(crate) const OVR_DICTIONARY: &str = "{1:dx,1:dy,}Eprj_Coordinate,\
{1:dwidth,1:dheight,}Eprj_Size,\
{0:pcstring,}Emif_String,\
{1:lorder,1:*bpolycoefmtx,1:*bpolycoefvector,}Efga_Polynomial,\
{1:lid,0:pcname,0:pcdescription,0:pcelmType,1:lelmTypeId,1:*oEfga_Polynomial,xformMatrix,1:lflags,}Element_Eant,\
{1:lid,0:pcname,0:pcdescription,0:pcelmType,1:lelmTypeId,1:*oEfga_Polynomial,xformMatrix,1:lflags,}Element_2_Eant,\
{1:lcount,}Eant_ElementList,\
{1:lcount,}Eant_Group,\
{1:oEprj_Coordinate,center,1:dwidth,1:dheight,1:dorientation,}Eant_Rectangle,\
{1:oEprj_Coordinate,center,1:dwidth,1:dheight,1:dorientation,}Rectangle2,\
{1:oEprj_Coordinate,center,1:dsemiMajorAxis,1:dsemiMinorAxis,1:dorientation,}Eant_Ellipse,\
{1:oEprj_Coordinate,origin,1:oEmif_String,text,1:dorientation,}Eant_Text,\
{1:oEprj_Coordinate,origin,1:oEmif_String,text,1:dorientation,}Text2,\
{1:oEprj_Coordinate,center,}Eant_Point,\
{1:*bcoords,}Eant_Vertices,\
{1:oEant_Vertices,vertices,1:lclosed,}Eant_Polyline,\
{1:oEant_Vertices,vertices,1:lclosed,}Eant_Polygon,\
{0:pcproName,1:*oEprj_Coordinate,upperLeftCenter,1:*oEprj_Coordinate,lowerRightCenter,1:*oEprj_Size,pixelSize,0:pcunits,}Eprj_MapInfo,\
{0:pcsphereName,1:da,1:db,1:deSquared,1:dradius,}Eprj_Spheroid,\
{1:e2:EPRJ_INTERNAL,EPRJ_EXTERNAL,proType,1:lproNumber,0:pcproExeName,0:pcproName,1:lproZone,0:pdproParams,1:*oEprj_Spheroid,proSpheroid,}Eprj_ProParameters,\
{0:pcdatumname,1:e3:EPRJ_DATUM_PARAMETRIC,EPRJ_DATUM_GRID,EPRJ_DATUM_REGRESSION,type,0:pdparams,0:pcgridname,}Eprj_Datum,.";

/// Encoded shape child of an element.
#[derive(Debug, Clone)]
pub(crate) struct ShapeSpec {
    pub type_name: &'static str,
    pub data: Vec<u8>,
}

impl ShapeSpec {
    pub fn rectangle(center: (f64, f64), width: f64, height: f64, orientation: f64) -> Self {
        let mut w = DataWriter::new();
        w.f64(center.0).f64(center.1).f64(width).f64(height).f64(orientation);
        Self {
            type_name: "Rectangle2",
            data: w.into_bytes(),
        }
    }

    pub fn ellipse(center: (f64, f64), semi_major: f64, semi_minor: f64, orientation: f64) -> Self {
        let mut w = DataWriter::new();
        w.f64(center.0)
            .f64(center.1)
            .f64(semi_major)
            .f64(semi_minor)
            .f64(orientation);
        Self {
            type_name: "Eant_Ellipse",
            data: w.into_bytes(),
        }
    }

    pub fn text(origin: (f64, f64), text: &str) -> Self {
        let mut w = DataWriter::new();
        w.f64(origin.0).f64(origin.1).string(text).f64(0.0);
        Self {
            type_name: "Text2",
            data: w.into_bytes(),
        }
    }

    pub fn point(center: (f64, f64)) -> Self {
        let mut w = DataWriter::new();
        w.f64(center.0).f64(center.1);
        Self {
            type_name: "Eant_Point",
            data: w.into_bytes(),
        }
    }

    /// Vertices stored as an `N x 2` block.
    pub fn polyline(points: &[(f64, f64)]) -> Self {
        let values: Vec<f64> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        Self::polyline_matrix(points.len() as i32, 2, &values)
    }

    pub fn polyline_matrix(rows: i32, columns: i32, values: &[f64]) -> Self {
        let mut w = DataWriter::new();
        w.matrix(rows, columns, values).i32(0);
        Self {
            type_name: "Eant_Polyline",
            data: w.into_bytes(),
        }
    }

    pub fn polygon(points: &[(f64, f64)]) -> Self {
        Self {
            type_name: "Eant_Polygon",
            ..Self::polyline(points)
        }
    }

    /// A child the registry does not know how to build.
    pub fn group() -> Self {
        Self {
            type_name: "Eant_Group",
            data: 0u32.to_le_bytes().to_vec(),
        }
    }

    pub fn with_type(mut self, type_name: &'static str) -> Self {
        self.type_name = type_name;
        self
    }
}

/// Metadata and transform of an element record.
#[derive(Debug, Clone)]
pub(crate) struct ElementSpec {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub type_id: i32,
    pub coefficients: Vec<f64>,
    pub translation: Vec<f64>,
}

impl ElementSpec {
    pub fn new(id: i32, name: &str, type_id: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            type_id,
            coefficients: vec![1.0, 0.0, 0.0, 1.0],
            translation: vec![0.0, 0.0],
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_transform(mut self, coefficients: &[f64], translation: &[f64]) -> Self {
        self.coefficients = coefficients.to_vec();
        self.translation = translation.to_vec();
        self
    }

    fn type_label(&self) -> &'static str {
        match self.type_id {
            10 => "Text",
            12 => "Rectangle",
            13 => "Ellipse",
            15 => "Polygon",
            16 => "Polyline",
            _ => "Unknown",
        }
    }

    fn encode(&self) -> Vec<u8> {
        let block = |values: &[f64]| match values.len() {
            4 => (2, 2),
            2 => (2, 1),
            n => (1, n as i32),
        };
        let (cr, cc) = block(&self.coefficients);
        let (vr, vc) = block(&self.translation);

        let mut w = DataWriter::new();
        w.i32(self.id)
            .string(&self.name)
            .string(&self.description)
            .string(self.type_label())
            .i32(self.type_id)
            .pointer(1)
            .i32(1)
            .matrix(cr, cc, &self.coefficients)
            .matrix(vr, vc, &self.translation)
            .i32(0);
        w.into_bytes()
    }
}

/// Builds overlay images with an element list under the root.
pub(crate) struct OvrBuilder {
    inner: HfaBuilder,
    list: Option<usize>,
    element_type: &'static str,
}

impl OvrBuilder {
    pub fn new() -> Self {
        let mut inner = HfaBuilder::new(OVR_DICTIONARY);
        let list = inner.add(
            HfaBuilder::ROOT,
            "ElementList",
            "Eant_ElementList",
            0u32.to_le_bytes().to_vec(),
        );
        Self {
            inner,
            list: Some(list),
            element_type: "Element_2_Eant",
        }
    }

    pub fn without_element_list() -> Self {
        Self {
            inner: HfaBuilder::new(OVR_DICTIONARY),
            list: None,
            element_type: "Element_2_Eant",
        }
    }

    /// Write elements with the legacy record type.
    pub fn legacy(mut self) -> Self {
        self.element_type = "Element_Eant";
        self
    }

    /// Parent for top-level elements; the root when there is no list.
    pub fn list(&self) -> usize {
        self.list.unwrap_or(HfaBuilder::ROOT)
    }

    pub fn raw(&mut self) -> &mut HfaBuilder {
        &mut self.inner
    }

    /// Element with an identity transform and a single shape child.
    pub fn element(&mut self, id: i32, name: &str, type_id: i32, shape: ShapeSpec) -> usize {
        let parent = self.list();
        self.add_element(parent, &ElementSpec::new(id, name, type_id), vec![shape])
    }

    pub fn add_element(&mut self, parent: usize, spec: &ElementSpec, shapes: Vec<ShapeSpec>) -> usize {
        let element = self
            .inner
            .add(parent, &spec.name, self.element_type, spec.encode());
        for (i, shape) in shapes.into_iter().enumerate() {
            self.inner
                .add(element, &format!("{}_shape{}", spec.name, i), shape.type_name, shape.data);
        }
        element
    }

    pub fn group(&mut self, parent: usize, name: &str) -> usize {
        self.inner
            .add(parent, name, "Eant_Group", 0u32.to_le_bytes().to_vec())
    }

    pub fn map_info(&mut self, upper_left: (f64, f64), units: &str) -> &mut Self {
        let mut w = DataWriter::new();
        w.string("UTM")
            .pointer(1)
            .f64(upper_left.0)
            .f64(upper_left.1)
            .pointer(1)
            .f64(upper_left.0 + 1000.0)
            .f64(upper_left.1 - 1000.0)
            .pointer(1)
            .f64(1.0)
            .f64(1.0)
            .string(units);
        self.inner
            .add(HfaBuilder::ROOT, "Map_Info", "Eprj_MapInfo", w.into_bytes());
        self
    }

    pub fn projection(&mut self, number: i32, zone: i32, north: bool, spheroid: &str) -> &mut Self {
        let mut params = [0.0; 15];
        params[3] = if north { 1.0 } else { -1.0 };
        let mut w = DataWriter::new();
        w.u16(0)
            .i32(number)
            .string("")
            .string("UTM")
            .i32(zone)
            .f64_array(&params)
            .pointer(1)
            .string(spheroid)
            .f64(6378137.0)
            .f64(6356752.314)
            .f64(0.00669438)
            .f64(6378137.0);
        self.inner
            .add(HfaBuilder::ROOT, "Projection", "Eprj_ProParameters", w.into_bytes());
        self
    }

    pub fn datum(&mut self, name: &str) -> &mut Self {
        let mut w = DataWriter::new();
        w.string(name).u16(0).f64_array(&[0.0; 7]).string("");
        self.inner
            .add(HfaBuilder::ROOT, "Datum", "Eprj_Datum", w.into_bytes());
        self
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        self.inner.build()
    }

    pub fn build(&self) -> HfaFile {
        HfaFile::from_bytes(self.build_bytes()).expect("fixture image parses")
    }
}
