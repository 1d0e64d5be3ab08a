use serde::Serialize;

/// Geographic coordinate systems that can be named without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WellKnownGeogCs {
    Wgs84,
    Wgs72,
    /// NAD83 on the GRS 1980 ellipsoid
    Nad83,
    /// NAD27 on the Clarke 1866 ellipsoid
    Nad27,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl WellKnownGeogCs {
    /// Match a datum or spheroid name as stored in the projection records,
    /// e.g. `WGS 84`, `NAD83`, `GRS 1980` or `Clarke 1866`.
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "WGS84" | "WORLDGEODETICSYSTEM1984" => Some(Self::Wgs84),
            "WGS72" | "WORLDGEODETICSYSTEM1972" => Some(Self::Wgs72),
            "NAD83" | "NORTHAMERICANDATUM1983" | "GRS1980" | "GRS80" => Some(Self::Nad83),
            "NAD27" | "NORTHAMERICANDATUM1927" | "CLARKE1866" => Some(Self::Nad27),
            _ => None,
        }
    }

    /// Match a PROJ.4 `+datum=` or `+ellps=` value.
    pub fn from_proj4(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WGS84" => Some(Self::Wgs84),
            "WGS72" => Some(Self::Wgs72),
            "NAD83" | "GRS80" => Some(Self::Nad83),
            "NAD27" | "CLRK66" => Some(Self::Nad27),
            _ => None,
        }
    }

    pub fn proj4_datum(self) -> &'static str {
        match self {
            Self::Wgs84 => "+datum=WGS84",
            Self::Wgs72 => "+ellps=WGS72 +towgs84=0,0,4.5,0,0,0.554,0.2263",
            Self::Nad83 => "+datum=NAD83",
            Self::Nad27 => "+datum=NAD27",
        }
    }

    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Wgs72 => 4322,
            Self::Nad83 => 4269,
            Self::Nad27 => 4267,
        }
    }

    /// EPSG code of UTM zone 0 in the given hemisphere; zone codes follow
    /// consecutively. NAD zones are only defined in the north.
    pub fn utm_epsg_base(self, north: bool) -> Option<u32> {
        match (self, north) {
            (Self::Wgs84, true) => Some(32600),
            (Self::Wgs84, false) => Some(32700),
            (Self::Wgs72, true) => Some(32200),
            (Self::Wgs72, false) => Some(32300),
            (Self::Nad83, true) => Some(26900),
            (Self::Nad27, true) => Some(26700),
            _ => None,
        }
    }

    /// Prefix of ESRI projected system names (`WGS_1984_UTM_Zone_55S`).
    pub fn esri_prefix(self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS_1984",
            Self::Wgs72 => "WGS_1972",
            Self::Nad83 => "NAD_1983",
            Self::Nad27 => "NAD_1927",
        }
    }

    pub fn esri_geogcs(self) -> String {
        let (gcs, datum, spheroid, a, rf) = match self {
            Self::Wgs84 => ("GCS_WGS_1984", "D_WGS_1984", "WGS_1984", "6378137.0", "298.257223563"),
            Self::Wgs72 => ("GCS_WGS_1972", "D_WGS_1972", "WGS_1972", "6378135.0", "298.26"),
            Self::Nad83 => (
                "GCS_North_American_1983",
                "D_North_American_1983",
                "GRS_1980",
                "6378137.0",
                "298.257222101",
            ),
            Self::Nad27 => (
                "GCS_North_American_1927",
                "D_North_American_1927",
                "Clarke_1866",
                "6378206.4",
                "294.9786982",
            ),
        };
        format!(
            "GEOGCS[\"{}\",DATUM[\"{}\",SPHEROID[\"{}\",{},{}]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]",
            gcs, datum, spheroid, a, rf
        )
    }
}
