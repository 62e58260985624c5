//! Coordinate Reference System types and `srsName` resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG codes the map service knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// Lambert Conformal Conic (CONUS)
    Epsg5070,
    /// Polar Stereographic North
    Epsg3413,
    /// Polar Stereographic South
    Epsg3031,
    /// Any other EPSG code
    Other(u32),
}

impl CrsCode {
    /// The numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg5070 => 5070,
            CrsCode::Epsg3413 => 3413,
            CrsCode::Epsg3031 => 3031,
            CrsCode::Other(code) => *code,
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// An identifier issued by an authority other than EPSG (e.g. "ESRI:102003").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsIdentifier {
    pub authority: String,
    pub code: String,
}

/// A coordinate reference system attached to a layer's feature type.
///
/// Only identification is modelled; no projection math lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// Human-readable name (e.g. "WGS 84")
    pub name: String,

    /// EPSG code, when the CRS has one
    pub code: Option<CrsCode>,

    /// Identifier from another authority, used when there is no EPSG code
    pub identifier: Option<CrsIdentifier>,
}

impl Crs {
    pub fn new(code: CrsCode) -> Self {
        let name = match code {
            CrsCode::Epsg4326 => "WGS 84".to_string(),
            CrsCode::Epsg3857 => "WGS 84 / Pseudo-Mercator".to_string(),
            CrsCode::Epsg4269 => "NAD83".to_string(),
            other => other.to_string(),
        };
        Self {
            name,
            code: Some(code),
            identifier: None,
        }
    }

    /// A CRS identified by a non-EPSG authority.
    pub fn with_identifier(
        name: impl Into<String>,
        authority: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: None,
            identifier: Some(CrsIdentifier {
                authority: authority.into(),
                code: code.into(),
            }),
        }
    }

    /// A CRS with no usable identifier (e.g. an engineering/local system).
    pub fn unidentified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            identifier: None,
        }
    }
}

/// How an EPSG code is spelled when written as an `srsName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SrsNameStyle {
    /// `EPSG:4326`
    Normal,
    /// `http://www.opengis.net/gml/srs/epsg.xml#4326` (GML 2 convention)
    #[default]
    Xml,
    /// `http://www.opengis.net/def/crs/EPSG/0/4326`
    Url,
    /// `urn:ogc:def:crs:EPSG::4326`
    Urn,
}

impl SrsNameStyle {
    pub fn format(&self, epsg: u32) -> String {
        match self {
            SrsNameStyle::Normal => format!("EPSG:{}", epsg),
            SrsNameStyle::Xml => format!("http://www.opengis.net/gml/srs/epsg.xml#{}", epsg),
            SrsNameStyle::Url => format!("http://www.opengis.net/def/crs/EPSG/0/{}", epsg),
            SrsNameStyle::Urn => format!("urn:ogc:def:crs:EPSG::{}", epsg),
        }
    }
}

/// Resolves a CRS to the URI string written as `srsName`.
///
/// Returns `None` when the CRS cannot be identified. Implementations must be
/// pure: the same CRS always resolves to the same string.
pub trait CrsUriResolver {
    fn resolve(&self, crs: &Crs) -> Option<String>;
}

impl<F> CrsUriResolver for F
where
    F: Fn(&Crs) -> Option<String>,
{
    fn resolve(&self, crs: &Crs) -> Option<String> {
        self(crs)
    }
}

/// Default resolver: EPSG codes in the configured style, other authorities
/// as `AUTHORITY:code`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyledCrsResolver {
    pub style: SrsNameStyle,
}

impl StyledCrsResolver {
    pub fn new(style: SrsNameStyle) -> Self {
        Self { style }
    }
}

impl CrsUriResolver for StyledCrsResolver {
    fn resolve(&self, crs: &Crs) -> Option<String> {
        if let Some(code) = crs.code {
            return Some(self.style.format(code.epsg()));
        }
        crs.identifier
            .as_ref()
            .map(|id| format!("{}:{}", id.authority, id.code))
    }
}
