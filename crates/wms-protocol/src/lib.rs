//! OGC WMS protocol implementation.
//!
//! Supports:
//! - WMS 1.1.1 and WMS 1.3.0 GetFeatureInfo, including GML output
//! - GML 2.1.2 feature collection encoding over a minimal WFS GetFeature model

pub mod getfeatureinfo;
pub mod gml;
pub mod settings;
pub mod wfs;

pub use getfeatureinfo::{
    FeatureInfoError, FeatureInfoOutputFormat, FeatureInfoResults, GetFeatureInfoRequest,
    GmlFeatureInfoFormat, InfoFormat, GML_FEATURE_INFO_MIME,
};
pub use gml::{EncodeError, FeatureCollectionEncoder, Gml2Encoder, GML2_MIME};
pub use settings::{GmlSettings, SettingsError};
pub use wfs::{
    FeatureCollectionResponse, GetFeatureRequest, Operation, Query, Service, SrsName,
    UriSyntaxError,
};
