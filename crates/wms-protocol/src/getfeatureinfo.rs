//! WMS GetFeatureInfo handling
//!
//! Request parameters, the supported INFO_FORMAT values, and the GML
//! output format. GML output does no encoding of its own: it re-packages
//! the per-layer results as a WFS GetFeature response and hands that to a
//! [`FeatureCollectionEncoder`].

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, warn};

use wms_common::{CrsUriResolver, FeatureCollection, StyledCrsResolver, WmsError};

use crate::gml::{EncodeError, FeatureCollectionEncoder, Gml2Encoder};
use crate::settings::GmlSettings;
use crate::wfs::{
    FeatureCollectionResponse, GetFeatureRequest, Operation, Query, SrsName, UriSyntaxError,
};

/// MIME type of GML feature-info output.
pub const GML_FEATURE_INFO_MIME: &str = "application/vnd.ogc.gml";

/// GetFeatureInfo request parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GetFeatureInfoRequest {
    /// Base URL the request was received on; echoed into generated documents
    pub base_url: String,
    /// Layers to display (same as GetMap)
    pub layers: Vec<String>,
    /// Layers to query for information
    pub query_layers: Vec<String>,
    /// Coordinate reference system
    pub crs: String,
    /// Bounding box [min_x, min_y, max_x, max_y]
    pub bbox: [f64; 4],
    /// Map width in pixels
    pub width: u32,
    /// Map height in pixels
    pub height: u32,
    /// Pixel column (X coordinate, 0-based from left)
    pub i: u32,
    /// Pixel row (Y coordinate, 0-based from top)
    pub j: u32,
    /// Response format
    pub info_format: InfoFormat,
    /// Maximum number of features to return
    pub feature_count: Option<u32>,
}

/// Supported GetFeatureInfo response formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum InfoFormat {
    /// application/json - Machine-readable JSON
    #[serde(rename = "application/json")]
    Json,
    /// text/html - Human-readable HTML for popups
    #[serde(rename = "text/html")]
    #[default]
    Html,
    /// text/xml - OGC-compliant XML
    #[serde(rename = "text/xml")]
    Xml,
    /// text/plain - Simple text format
    #[serde(rename = "text/plain")]
    Text,
    /// application/vnd.ogc.gml - GML 2 feature collection
    #[serde(rename = "application/vnd.ogc.gml")]
    Gml,
}

impl InfoFormat {
    /// Parse from MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "application/json" => Some(InfoFormat::Json),
            "text/html" => Some(InfoFormat::Html),
            "text/xml" => Some(InfoFormat::Xml),
            "text/plain" => Some(InfoFormat::Text),
            GML_FEATURE_INFO_MIME => Some(InfoFormat::Gml),
            _ => None,
        }
    }

    /// Get MIME type string
    pub fn to_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Html => "text/html",
            InfoFormat::Xml => "text/xml",
            InfoFormat::Text => "text/plain",
            InfoFormat::Gml => GML_FEATURE_INFO_MIME,
        }
    }
}

/// Per-layer results of a GetFeatureInfo query, in query-layer order.
#[derive(Debug, Clone, Default)]
pub struct FeatureInfoResults {
    pub collections: Vec<FeatureCollection>,
}

impl FeatureInfoResults {
    pub fn new(collections: Vec<FeatureCollection>) -> Self {
        Self { collections }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureInfoError {
    #[error(
        "Unable to determine coordinate system for feature type {layer}. \
         Schema told us '{uri}'"
    )]
    InvalidCrsUri {
        layer: String,
        uri: String,
        #[source]
        source: UriSyntaxError,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<FeatureInfoError> for WmsError {
    fn from(err: FeatureInfoError) -> Self {
        match err {
            FeatureInfoError::InvalidCrsUri { .. } => WmsError::InternalError(err.to_string()),
            FeatureInfoError::Encode(e) => WmsError::EncodingError(e.to_string()),
        }
    }
}

/// Writes GetFeatureInfo results in one INFO_FORMAT.
pub trait FeatureInfoOutputFormat {
    fn mime_type(&self) -> &str;

    fn can_produce(&self, mime: &str) -> bool {
        self.mime_type().eq_ignore_ascii_case(mime.trim())
    }

    fn write(
        &self,
        results: &FeatureInfoResults,
        request: &GetFeatureInfoRequest,
        out: &mut dyn Write,
    ) -> Result<(), FeatureInfoError>;
}

/// GML feature-info output: bridges feature-info results onto a WFS
/// feature collection encoder.
#[derive(Debug, Clone)]
pub struct GmlFeatureInfoFormat<R = StyledCrsResolver, E = Gml2Encoder> {
    format: String,
    resolver: R,
    encoder: E,
}

impl GmlFeatureInfoFormat {
    pub fn new(settings: GmlSettings) -> Self {
        Self::with_format(settings, GML_FEATURE_INFO_MIME)
    }

    /// Same output under a different MIME type.
    pub fn with_format(settings: GmlSettings, format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            resolver: StyledCrsResolver::new(settings.srs_name_style),
            encoder: Gml2Encoder::new(settings),
        }
    }
}

impl<R, E> GmlFeatureInfoFormat<R, E>
where
    R: CrsUriResolver,
    E: FeatureCollectionEncoder,
{
    pub fn with_parts(resolver: R, encoder: E) -> Self {
        Self {
            format: GML_FEATURE_INFO_MIME.to_string(),
            resolver,
            encoder,
        }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Build the query describing one layer's collection.
    pub fn build_query(&self, collection: &FeatureCollection) -> Result<Query, FeatureInfoError> {
        let uri = collection
            .crs
            .as_ref()
            .and_then(|crs| self.resolver.resolve(crs));

        let srs_name = match uri {
            Some(uri) => match SrsName::parse(&uri) {
                Ok(srs) => Some(srs),
                Err(source) => {
                    warn!(layer = %collection.name, uri = %uri, "Invalid CRS URI");
                    return Err(FeatureInfoError::InvalidCrsUri {
                        layer: collection.name.clone(),
                        uri,
                        source,
                    });
                }
            },
            None => None,
        };

        debug!(
            layer = %collection.name,
            srs_name = srs_name.as_ref().map(SrsName::as_str).unwrap_or("unknown"),
            "Built feature-info query"
        );
        Ok(Query { srs_name })
    }

    /// Build the GetFeature request and response for a set of results.
    ///
    /// Query `i` of the request describes collection `i` of the response.
    pub fn build_request<'a>(
        &self,
        results: &'a FeatureInfoResults,
        request: &GetFeatureInfoRequest,
    ) -> Result<(GetFeatureRequest, FeatureCollectionResponse<'a>), FeatureInfoError> {
        let mut get_feature = GetFeatureRequest::new(request.base_url.clone());
        let mut response = FeatureCollectionResponse::new();

        for collection in &results.collections {
            get_feature.queries.push(self.build_query(collection)?);
            response.features.push(collection);
        }

        Ok((get_feature, response))
    }
}

impl<R, E> FeatureInfoOutputFormat for GmlFeatureInfoFormat<R, E>
where
    R: CrsUriResolver,
    E: FeatureCollectionEncoder,
{
    fn mime_type(&self) -> &str {
        &self.format
    }

    fn write(
        &self,
        results: &FeatureInfoResults,
        request: &GetFeatureInfoRequest,
        out: &mut dyn Write,
    ) -> Result<(), FeatureInfoError> {
        let (get_feature, response) = self.build_request(results, request)?;
        let operation = Operation::feature_info(&get_feature);

        debug!(
            format = %self.format,
            collections = response.len(),
            "Delegating feature-info results to GML encoder"
        );
        self.encoder.encode(&response, out, &operation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::{Crs, CrsCode};

    fn request(base_url: &str) -> GetFeatureInfoRequest {
        GetFeatureInfoRequest {
            base_url: base_url.to_string(),
            layers: vec!["lakes".to_string()],
            query_layers: vec!["lakes".to_string()],
            crs: "EPSG:4326".to_string(),
            bbox: [-180.0, -90.0, 180.0, 90.0],
            width: 256,
            height: 256,
            i: 128,
            j: 128,
            info_format: InfoFormat::Gml,
            feature_count: None,
        }
    }

    #[test]
    fn test_info_format_parsing() {
        assert_eq!(
            InfoFormat::from_mime("application/json"),
            Some(InfoFormat::Json)
        );
        assert_eq!(InfoFormat::from_mime("text/html"), Some(InfoFormat::Html));
        assert_eq!(InfoFormat::from_mime("TEXT/HTML"), Some(InfoFormat::Html));
        assert_eq!(
            InfoFormat::from_mime("application/vnd.ogc.gml"),
            Some(InfoFormat::Gml)
        );
        assert_eq!(InfoFormat::Gml.to_mime(), GML_FEATURE_INFO_MIME);
        assert_eq!(InfoFormat::from_mime("image/png"), None);
    }

    #[test]
    fn test_gml_mime_differs_from_wfs_gml() {
        assert_ne!(GML_FEATURE_INFO_MIME, crate::gml::GML2_MIME);
    }

    #[test]
    fn test_can_produce() {
        let format = GmlFeatureInfoFormat::new(GmlSettings::default());
        assert!(format.can_produce("application/vnd.ogc.gml"));
        assert!(format.can_produce("APPLICATION/VND.OGC.GML "));
        assert!(!format.can_produce("text/html"));

        let custom = GmlFeatureInfoFormat::with_format(GmlSettings::default(), "application/vnd.ogc.gml/3.1.1");
        assert_eq!(custom.mime_type(), "application/vnd.ogc.gml/3.1.1");
    }

    #[test]
    fn test_build_query_uses_configured_style() {
        let settings = GmlSettings {
            srs_name_style: wms_common::SrsNameStyle::Urn,
            ..GmlSettings::default()
        };
        let format = GmlFeatureInfoFormat::new(settings);
        let fc = FeatureCollection::new("lakes", Some(Crs::new(CrsCode::Epsg4326)));

        let query = format.build_query(&fc).unwrap();
        assert_eq!(
            query.srs_name.as_ref().map(SrsName::as_str),
            Some("urn:ogc:def:crs:EPSG::4326")
        );
    }

    #[test]
    fn test_build_query_without_crs() {
        let format = GmlFeatureInfoFormat::new(GmlSettings::default());
        let fc = FeatureCollection::new("roads", None);
        assert_eq!(format.build_query(&fc).unwrap().srs_name, None);

        let local = FeatureCollection::new("grid", Some(Crs::unidentified("local grid")));
        assert_eq!(format.build_query(&local).unwrap().srs_name, None);
    }

    #[test]
    fn test_build_request_copies_base_url() {
        let format = GmlFeatureInfoFormat::new(GmlSettings::default());
        let results = FeatureInfoResults::new(vec![
            FeatureCollection::new("lakes", Some(Crs::new(CrsCode::Epsg4326))),
            FeatureCollection::new("roads", None),
        ]);

        let (get_feature, response) = format
            .build_request(&results, &request("http://maps.example.com/geoserver/"))
            .unwrap();
        assert_eq!(get_feature.base_url, "http://maps.example.com/geoserver/");
        assert_eq!(get_feature.queries.len(), 2);
        assert_eq!(response.len(), 2);
        assert!(get_feature.queries[0].srs_name.is_some());
        assert!(get_feature.queries[1].srs_name.is_none());
    }

    #[test]
    fn test_invalid_crs_uri_maps_to_wms_error() {
        let resolver = |_: &Crs| Some("not a uri".to_string());
        let format = GmlFeatureInfoFormat::with_parts(resolver, Gml2Encoder::default());
        let fc = FeatureCollection::new("lakes", Some(Crs::new(CrsCode::Epsg4326)));

        let err = format.build_query(&fc).unwrap_err();
        assert!(err.to_string().contains("lakes"));
        assert!(err.to_string().contains("not a uri"));

        let wms: WmsError = err.into();
        assert_eq!(wms.wms_exception_code(), "NoApplicableCode");
        assert_eq!(wms.http_status_code(), 500);
    }
}
