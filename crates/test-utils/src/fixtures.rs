//! Common test fixtures for feature-info tests.
//!
//! Layers are small and hand-built so assertions can name exact values.

use wms_common::{Coord, Crs, CrsCode, Feature, FeatureCollection, Geometry, Polygon};
use wms_protocol::{GetFeatureInfoRequest, InfoFormat};

/// Base URL used by fixture requests.
pub const BASE_URL: &str = "http://localhost:8080/geoserver/";

/// Two polygons in EPSG:4326.
pub fn lakes() -> FeatureCollection {
    let square = |x: f64, y: f64, size: f64| {
        Polygon::new(vec![
            Coord::new(x, y),
            Coord::new(x + size, y),
            Coord::new(x + size, y + size),
            Coord::new(x, y + size),
            Coord::new(x, y),
        ])
    };

    FeatureCollection::new("lakes", Some(Crs::new(CrsCode::Epsg4326)))
        .with_feature(
            Feature::new("lakes.1")
                .with_geometry(Geometry::Polygon(square(10.0, 45.0, 1.0)))
                .with_property("name", "Lago Maggiore")
                .with_property("depth", 372.0),
        )
        .with_feature(
            Feature::new("lakes.2")
                .with_geometry(Geometry::Polygon(square(12.5, 46.0, 0.5)))
                .with_property("name", "Lago di Garda & Co")
                .with_property("depth", 346.0),
        )
}

/// One line with no known CRS.
pub fn roads() -> FeatureCollection {
    FeatureCollection::new("roads", None).with_feature(
        Feature::new("roads.1")
            .with_geometry(Geometry::LineString(vec![
                Coord::new(9.5, 45.5),
                Coord::new(11.27, 45.74),
            ]))
            .with_property("lanes", 2i64),
    )
}

/// A layer whose CRS only has a non-EPSG identifier.
pub fn parcels() -> FeatureCollection {
    FeatureCollection::new(
        "parcels",
        Some(Crs::with_identifier("USA Contiguous Albers", "ESRI", "102003")),
    )
    .with_feature(Feature::new("parcels.1").with_geometry(Geometry::Point(Coord::new(1500.0, -250.0))))
}

/// A GetFeatureInfo request for the GML info format.
pub fn gml_request(query_layers: &[&str]) -> GetFeatureInfoRequest {
    GetFeatureInfoRequest {
        base_url: BASE_URL.to_string(),
        layers: query_layers.iter().map(|s| s.to_string()).collect(),
        query_layers: query_layers.iter().map(|s| s.to_string()).collect(),
        crs: "EPSG:4326".to_string(),
        bbox: [9.0, 44.0, 14.0, 48.0],
        width: 512,
        height: 512,
        i: 200,
        j: 300,
        info_format: InfoFormat::Gml,
        feature_count: Some(10),
    }
}
