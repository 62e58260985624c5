//! Minimal WFS GetFeature request/response model.
//!
//! Only the pieces the GML encoder reads are modelled: the base URL, one
//! query per feature collection (carrying its `srsName`), the collections
//! themselves, and the operation the request arrived through.

use iri_string::types::{UriReferenceStr, UriReferenceString};
use std::fmt;

use wms_common::FeatureCollection;

/// Syntax error in an `srsName`.
pub type UriSyntaxError = iri_string::validate::Error;

/// An `srsName` checked against the RFC 3986 URI-reference grammar.
///
/// Relative references are accepted. The string is stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrsName {
    uri: UriReferenceString,
}

impl SrsName {
    pub fn parse(s: &str) -> Result<Self, UriSyntaxError> {
        let uri = UriReferenceStr::new(s)?.to_owned();
        Ok(Self { uri })
    }

    pub fn as_str(&self) -> &str {
        self.uri.as_str()
    }
}

impl fmt::Display for SrsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One GetFeature query. Positionally describes the collection at the
/// same index of the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// CRS of the collection; `None` when unknown
    pub srs_name: Option<SrsName>,
}

/// GetFeature request as seen by output formats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFeatureRequest {
    pub base_url: String,
    pub queries: Vec<Query>,
}

impl GetFeatureRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            queries: Vec::new(),
        }
    }
}

/// Feature collections to encode, borrowed unmodified from the caller.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollectionResponse<'a> {
    pub features: Vec<&'a FeatureCollection>,
}

impl<'a> FeatureCollectionResponse<'a> {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Service an operation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub version: Option<String>,
}

impl Service {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }
}

/// The operation an output format is invoked for.
///
/// The GetFeature request is a typed field: encoders read their query
/// metadata from it directly.
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    pub id: String,
    pub service: Service,
    pub request: &'a GetFeatureRequest,
}

impl<'a> Operation<'a> {
    pub fn new(id: impl Into<String>, service: Service, request: &'a GetFeatureRequest) -> Self {
        Self {
            id: id.into(),
            service,
            request,
        }
    }

    /// Placeholder context for re-encoding WMS feature-info results.
    ///
    /// The operation id is empty: this is not a dispatched WFS operation and
    /// must not be treated as one.
    pub fn feature_info(request: &'a GetFeatureRequest) -> Self {
        Self::new("", Service::new("wms"), request)
    }
}
