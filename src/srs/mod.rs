//! Spatial reference of an overlay.
//!
//! Overlays carry the map information of the image they annotate in three
//! records, `Map_Info`, `Projection` and `Datum`, found anywhere in the
//! entry tree. Only UTM projections over a handful of well-known datums are
//! recognized; anything else leaves the layer without a spatial reference
//! and the geometry in raw map units.

mod geogcs;

pub use geogcs::WellKnownGeogCs;

use crate::common::{Error, Result};
use crate::hfa::{HfaFile, HfaResult, NodeData};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub const MAP_INFO_NODE: &str = "Map_Info";
pub const PROJECTION_NODE: &str = "Projection";
pub const DATUM_NODE: &str = "Datum";

/// `proNumber` of the UTM projection.
pub const PROJECTION_UTM: i64 = 1;
/// `proNumber` of unprojected geographic coordinates.
pub const PROJECTION_GEOGRAPHIC: i64 = 0;

const PRO_PARAM_COUNT: usize = 15;
const DATUM_PARAM_COUNT: usize = 7;

fn opt_string(data: &NodeData<'_>, path: &str) -> HfaResult<String> {
    Ok(data.find_string_field(path)?.unwrap_or_default())
}

fn opt_double(data: &NodeData<'_>, path: &str) -> HfaResult<f64> {
    Ok(data.field(path)?.and_then(|v| v.as_f64()).unwrap_or(0.0))
}

fn opt_int(data: &NodeData<'_>, path: &str) -> HfaResult<i64> {
    Ok(data.field(path)?.and_then(|v| v.as_i64()).unwrap_or(0))
}

fn load_node<'a>(file: &'a HfaFile, name: &str) -> Option<NodeData<'a>> {
    let node = file.find(name)?;
    match node.load_data() {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(node = name, error = %e, "unreadable map information record");
            None
        },
    }
}

/// `Eprj_MapInfo`: extent and units of the annotated image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapInfo {
    pub projection_name: String,
    pub upper_left_center: (f64, f64),
    pub lower_right_center: (f64, f64),
    pub pixel_size: (f64, f64),
    pub units: String,
}

impl MapInfo {
    pub fn read(file: &HfaFile) -> Option<Self> {
        let data = load_node(file, MAP_INFO_NODE)?;
        Self::decode(&data)
            .inspect_err(|e| warn!(error = %e, "malformed map information"))
            .ok()
    }

    fn decode(data: &NodeData<'_>) -> HfaResult<Self> {
        Ok(Self {
            projection_name: opt_string(data, "proName")?,
            upper_left_center: (
                opt_double(data, "upperLeftCenter.x")?,
                opt_double(data, "upperLeftCenter.y")?,
            ),
            lower_right_center: (
                opt_double(data, "lowerRightCenter.x")?,
                opt_double(data, "lowerRightCenter.y")?,
            ),
            pixel_size: (
                opt_double(data, "pixelSize.width")?,
                opt_double(data, "pixelSize.height")?,
            ),
            units: opt_string(data, "units")?,
        })
    }
}

/// `Eprj_Spheroid`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spheroid {
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub e_squared: f64,
    pub radius: f64,
}

/// `Eprj_ProParameters`: projection number, zone and parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionParams {
    pub pro_type: i64,
    pub pro_number: i64,
    pub exe_name: String,
    pub name: String,
    pub zone: i64,
    pub params: [f64; PRO_PARAM_COUNT],
    pub spheroid: Spheroid,
}

impl ProjectionParams {
    pub fn read(file: &HfaFile) -> Option<Self> {
        let data = load_node(file, PROJECTION_NODE)?;
        Self::decode(&data)
            .inspect_err(|e| warn!(error = %e, "malformed projection parameters"))
            .ok()
    }

    fn decode(data: &NodeData<'_>) -> HfaResult<Self> {
        let mut params = [0.0; PRO_PARAM_COUNT];
        for (i, p) in params.iter_mut().enumerate() {
            *p = opt_double(data, &format!("proParams[{}]", i))?;
        }
        Ok(Self {
            pro_type: opt_int(data, "proType")?,
            pro_number: opt_int(data, "proNumber")?,
            exe_name: opt_string(data, "proExeName")?,
            name: opt_string(data, "proName")?,
            zone: opt_int(data, "proZone")?,
            params,
            spheroid: Spheroid {
                name: opt_string(data, "proSpheroid.sphereName")?,
                a: opt_double(data, "proSpheroid.a")?,
                b: opt_double(data, "proSpheroid.b")?,
                e_squared: opt_double(data, "proSpheroid.eSquared")?,
                radius: opt_double(data, "proSpheroid.radius")?,
            },
        })
    }

    /// UTM hemisphere: the fourth parameter is negative in the south.
    pub fn is_north(&self) -> bool {
        self.params[3] >= 0.0
    }
}

/// `Eprj_Datum`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datum {
    pub name: String,
    pub kind: i64,
    pub params: [f64; DATUM_PARAM_COUNT],
    pub grid_name: String,
}

impl Datum {
    pub fn read(file: &HfaFile) -> Option<Self> {
        let data = load_node(file, DATUM_NODE)?;
        Self::decode(&data)
            .inspect_err(|e| warn!(error = %e, "malformed datum"))
            .ok()
    }

    fn decode(data: &NodeData<'_>) -> HfaResult<Self> {
        let mut params = [0.0; DATUM_PARAM_COUNT];
        for (i, p) in params.iter_mut().enumerate() {
            *p = opt_double(data, &format!("params[{}]", i))?;
        }
        Ok(Self {
            name: opt_string(data, "datumname")?,
            kind: opt_int(data, "type")?,
            params,
            grid_name: opt_string(data, "gridname")?,
        })
    }
}

/// A UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Utm {
    pub zone: u8,
    pub north: bool,
}

impl Utm {
    pub fn new(zone: i64, north: bool) -> Option<Self> {
        (1..=60)
            .contains(&zone)
            .then(|| Self {
                zone: zone as u8,
                north,
            })
    }

    pub fn central_meridian(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    pub fn false_northing(&self) -> f64 {
        if self.north { 0.0 } else { 10_000_000.0 }
    }
}

/// Coordinate reference system of a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpatialReference {
    /// Recognized geographic system, optionally UTM-projected.
    Known {
        geog_cs: WellKnownGeogCs,
        utm: Option<Utm>,
    },
    /// Caller-supplied PROJ.4 definition that could not be mapped onto a
    /// known system; passed through verbatim.
    Proj4(String),
}

impl SpatialReference {
    pub fn geographic(geog_cs: WellKnownGeogCs) -> Self {
        SpatialReference::Known { geog_cs, utm: None }
    }

    pub fn utm(geog_cs: WellKnownGeogCs, zone: Utm) -> Self {
        SpatialReference::Known {
            geog_cs,
            utm: Some(zone),
        }
    }

    /// Parse a PROJ.4 definition such as
    /// `+proj=utm +zone=55 +south +datum=WGS84 +units=m +no_defs`.
    pub fn from_proj4(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        if !definition.starts_with('+') {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a PROJ.4 definition",
                definition
            )));
        }

        let mut proj = None;
        let mut zone = None;
        let mut south = false;
        let mut geog_cs = None;
        for token in definition.split_whitespace() {
            let token = token.trim_start_matches('+');
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            match key {
                "proj" => proj = Some(value),
                "zone" => zone = value.parse::<i64>().ok(),
                "south" => south = true,
                "datum" | "ellps" => geog_cs = geog_cs.or(WellKnownGeogCs::from_proj4(value)),
                _ => {},
            }
        }

        let known = match (proj, geog_cs) {
            (Some("utm"), Some(gcs)) => zone
                .and_then(|z| Utm::new(z, !south))
                .map(|utm| SpatialReference::utm(gcs, utm)),
            (Some("longlat" | "latlong"), Some(gcs)) => Some(SpatialReference::geographic(gcs)),
            _ => None,
        };
        Ok(known.unwrap_or_else(|| {
            debug!(definition, "keeping PROJ.4 definition verbatim");
            SpatialReference::Proj4(definition.to_string())
        }))
    }

    pub fn to_proj4(&self) -> String {
        match self {
            SpatialReference::Known { geog_cs, utm } => {
                let mut out = match utm {
                    Some(utm) => {
                        let mut s = format!("+proj=utm +zone={}", utm.zone);
                        if !utm.north {
                            s.push_str(" +south");
                        }
                        s
                    },
                    None => "+proj=longlat".to_string(),
                };
                out.push(' ');
                out.push_str(geog_cs.proj4_datum());
                if utm.is_some() {
                    out.push_str(" +units=m");
                }
                out.push_str(" +no_defs");
                out
            },
            SpatialReference::Proj4(s) => s.clone(),
        }
    }

    /// ESRI-flavoured WKT as written to `.prj` files. `None` for verbatim
    /// PROJ.4 definitions.
    pub fn to_esri_wkt(&self) -> Option<String> {
        let SpatialReference::Known { geog_cs, utm } = self else {
            return None;
        };
        let geogcs = geog_cs.esri_geogcs();
        Some(match utm {
            None => geogcs,
            Some(utm) => format!(
                "PROJCS[\"{}_UTM_Zone_{}{}\",{},PROJECTION[\"Transverse_Mercator\"],\
PARAMETER[\"False_Easting\",500000.0],PARAMETER[\"False_Northing\",{:.1}],\
PARAMETER[\"Central_Meridian\",{:.1}],PARAMETER[\"Scale_Factor\",0.9996],\
PARAMETER[\"Latitude_Of_Origin\",0.0],UNIT[\"Meter\",1.0]]",
                geog_cs.esri_prefix(),
                utm.zone,
                if utm.north { 'N' } else { 'S' },
                geogcs,
                utm.false_northing(),
                utm.central_meridian(),
            ),
        })
    }

    /// EPSG code, where one exists.
    pub fn epsg(&self) -> Option<u32> {
        let SpatialReference::Known { geog_cs, utm } = self else {
            return None;
        };
        match utm {
            None => Some(geog_cs.epsg()),
            Some(utm) => geog_cs
                .utm_epsg_base(utm.north)
                .map(|base| base + u32::from(utm.zone)),
        }
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_proj4())
    }
}

/// Derive the spatial reference from the map information records.
///
/// Returns `None`, with a warning, when the records are absent or describe a
/// system outside the supported set.
pub fn resolve(file: &HfaFile) -> Option<SpatialReference> {
    let map_info = MapInfo::read(file);
    if map_info.is_none() {
        warn!("no map information found");
    }
    let projection = ProjectionParams::read(file);
    if projection.is_none() {
        warn!("no projection found");
    }
    let datum = Datum::read(file);
    if datum.is_none() {
        debug!("no datum found, falling back to the spheroid");
    }

    let (_, projection) = map_info.zip(projection)?;

    let geog_name = match &datum {
        Some(datum) if !datum.name.is_empty() => datum.name.as_str(),
        _ => projection.spheroid.name.as_str(),
    };
    let Some(geog_cs) = WellKnownGeogCs::from_name(geog_name) else {
        warn!(datum = geog_name, "unrecognized datum, no spatial reference");
        return None;
    };

    match projection.pro_number {
        PROJECTION_UTM => match Utm::new(projection.zone, projection.is_north()) {
            Some(utm) => Some(SpatialReference::utm(geog_cs, utm)),
            None => {
                warn!(zone = projection.zone, "invalid UTM zone");
                None
            },
        },
        PROJECTION_GEOGRAPHIC => Some(SpatialReference::geographic(geog_cs)),
        other => {
            warn!(
                projection = %projection.name,
                number = other,
                "unsupported projection, no spatial reference"
            );
            None
        },
    }
}
