//! GetFeatureInfo GML output: translation onto the WFS encoder.

use test_utils::{
    gml_request, init_test_logging, lakes, parcels, roads, FailingEncoder, RecordingEncoder,
    BASE_URL, RECORDED_MARKER,
};
use wms_common::{Crs, CrsCode, FeatureCollection, StyledCrsResolver, WmsError};
use wms_protocol::{
    EncodeError, FeatureInfoError, FeatureInfoOutputFormat, FeatureInfoResults,
    GmlFeatureInfoFormat,
};

/// Plain `EPSG:code` spelling; no code means no srsName.
fn lakes_only(crs: &Crs) -> Option<String> {
    crs.code.map(|c| c.to_string())
}

fn recording_format<R>(resolver: R) -> GmlFeatureInfoFormat<R, RecordingEncoder>
where
    R: wms_common::CrsUriResolver,
{
    GmlFeatureInfoFormat::with_parts(resolver, RecordingEncoder::new())
}

// ============================================================================
// Request/response assembly
// ============================================================================

#[test]
fn test_two_layers_one_without_crs() {
    init_test_logging();
    let format = recording_format(lakes_only);
    let results = FeatureInfoResults::new(vec![lakes(), roads()]);
    let mut out = Vec::new();

    format
        .write(&results, &gml_request(&["lakes", "roads"]), &mut out)
        .unwrap();

    let calls = format.encoder().calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.srs_names, vec![Some("EPSG:4326".to_string()), None]);
    assert_eq!(call.collection_names, vec!["lakes", "roads"]);
    assert_eq!(out, RECORDED_MARKER);
}

#[test]
fn test_queries_match_collections_positionally() {
    let format = GmlFeatureInfoFormat::with_parts(StyledCrsResolver::default(), RecordingEncoder::new());
    let results = FeatureInfoResults::new(vec![roads(), lakes(), parcels(), roads()]);

    let (get_feature, response) = format
        .build_request(&results, &gml_request(&["roads", "lakes", "parcels", "roads"]))
        .unwrap();

    assert_eq!(get_feature.queries.len(), response.len());
    let srs: Vec<Option<&str>> = get_feature
        .queries
        .iter()
        .map(|q| q.srs_name.as_ref().map(|s| s.as_str()))
        .collect();
    assert_eq!(
        srs,
        vec![
            None,
            Some("http://www.opengis.net/gml/srs/epsg.xml#4326"),
            Some("ESRI:102003"),
            None,
        ]
    );
    for (i, fc) in results.collections.iter().enumerate() {
        assert!(std::ptr::eq(response.features[i], fc));
    }
}

#[test]
fn test_collections_are_passed_through_unaltered() {
    let format = recording_format(StyledCrsResolver::default());
    let results = FeatureInfoResults::new(vec![lakes(), roads()]);
    let before = results.clone();

    format
        .write(&results, &gml_request(&["lakes", "roads"]), &mut Vec::new())
        .unwrap();

    let call = &format.encoder().calls()[0];
    assert!(call.is_same_collection(0, &results.collections[0]));
    assert!(call.is_same_collection(1, &results.collections[1]));
    assert_eq!(results.collections, before.collections);
}

#[test]
fn test_base_url_passed_verbatim() {
    let format = recording_format(StyledCrsResolver::default());
    let mut request = gml_request(&["lakes"]);
    request.base_url = "https://Maps.Example.com:8443/ows?map=a b".to_string();

    format
        .write(&FeatureInfoResults::new(vec![lakes()]), &request, &mut Vec::new())
        .unwrap();

    assert_eq!(
        format.encoder().calls()[0].base_url,
        "https://Maps.Example.com:8443/ows?map=a b"
    );
}

#[test]
fn test_operation_context_is_placeholder() {
    let format = recording_format(StyledCrsResolver::default());
    format
        .write(&FeatureInfoResults::new(vec![lakes()]), &gml_request(&["lakes"]), &mut Vec::new())
        .unwrap();

    let call = &format.encoder().calls()[0];
    assert_eq!(call.operation_id, "");
    assert_eq!(call.service_id, "wms");
    assert_eq!(call.base_url, BASE_URL);
}

#[test]
fn test_zero_layers_still_invokes_encoder() {
    let format = recording_format(StyledCrsResolver::default());
    let mut out = Vec::new();

    format
        .write(&FeatureInfoResults::default(), &gml_request(&[]), &mut out)
        .unwrap();

    let calls = format.encoder().calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].srs_names.is_empty());
    assert!(calls[0].collection_names.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_malformed_crs_uri_fails_before_encoding() {
    init_test_logging();
    let format = recording_format(|_: &Crs| Some("not a uri".to_string()));
    let results = FeatureInfoResults::new(vec![lakes()]);
    let mut out = Vec::new();

    let err = format
        .write(&results, &gml_request(&["lakes"]), &mut out)
        .unwrap_err();

    match &err {
        FeatureInfoError::InvalidCrsUri { layer, uri, .. } => {
            assert_eq!(layer, "lakes");
            assert_eq!(uri, "not a uri");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(format.encoder().call_count(), 0);
    assert!(out.is_empty());
}

#[test]
fn test_malformed_crs_in_later_layer_aborts_whole_write() {
    let resolver = |crs: &Crs| match crs.code {
        Some(CrsCode::Epsg4326) => Some("EPSG:4326".to_string()),
        _ => Some("no scheme here".to_string()),
    };
    let format = recording_format(resolver);
    let broken = FeatureCollection::new("broken", Some(Crs::new(CrsCode::Epsg3857)));
    let results = FeatureInfoResults::new(vec![lakes(), broken]);
    let mut out = Vec::new();

    let err = format
        .write(&results, &gml_request(&["lakes", "broken"]), &mut out)
        .unwrap_err();

    assert!(matches!(err, FeatureInfoError::InvalidCrsUri { ref layer, .. } if layer == "broken"));
    assert_eq!(format.encoder().call_count(), 0);
    assert!(out.is_empty());
}

#[test]
fn test_crs_uri_with_illegal_characters_fails() {
    for bad in [
        "urn:ogc:def:crs:EPSG::4326 extra",
        "EPSG:4326 ",
        " EPSG:4326",
        "ESRI:102003 (custom)",
        "EPSG:43<26>",
    ] {
        let format = recording_format(move |_: &Crs| Some(bad.to_string()));
        let mut out = Vec::new();

        let err = format
            .write(&FeatureInfoResults::new(vec![lakes()]), &gml_request(&["lakes"]), &mut out)
            .unwrap_err();

        assert!(
            matches!(err, FeatureInfoError::InvalidCrsUri { ref uri, .. } if uri == bad),
            "{:?} was not rejected as an invalid CRS URI",
            bad
        );
        assert_eq!(format.encoder().call_count(), 0);
        assert!(out.is_empty());
    }
}

#[test]
fn test_relative_crs_reference_is_accepted() {
    for relative in ["4326", "epsg.xml#4326"] {
        let format = recording_format(move |_: &Crs| Some(relative.to_string()));

        format
            .write(&FeatureInfoResults::new(vec![lakes()]), &gml_request(&["lakes"]), &mut Vec::new())
            .unwrap();

        let calls = format.encoder().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].srs_names, vec![Some(relative.to_string())]);
    }
}

#[test]
fn test_encoder_failure_propagates_unchanged() {
    let format = GmlFeatureInfoFormat::with_parts(StyledCrsResolver::default(), FailingEncoder);

    let err = format
        .write(&FeatureInfoResults::new(vec![lakes()]), &gml_request(&["lakes"]), &mut Vec::new())
        .unwrap_err();

    assert_eq!(err.to_string(), "I/O error while writing GML: client went away");
    match err {
        FeatureInfoError::Encode(EncodeError::Io(io)) => {
            assert_eq!(io.kind(), std::io::ErrorKind::BrokenPipe)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_encoder_failure_reported_as_wms_exception() {
    let format = GmlFeatureInfoFormat::with_parts(StyledCrsResolver::default(), FailingEncoder);
    let err = format
        .write(&FeatureInfoResults::new(vec![roads()]), &gml_request(&["roads"]), &mut Vec::new())
        .unwrap_err();

    let wms: WmsError = err.into();
    assert!(matches!(wms, WmsError::EncodingError(_)));
    assert_eq!(wms.http_status_code(), 500);
}
