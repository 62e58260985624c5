//! Common types and utilities shared across all weather-wms services.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod feature;
pub mod geometry;

pub use bbox::BoundingBox;
pub use crs::{Crs, CrsCode, CrsUriResolver, SrsNameStyle, StyledCrsResolver};
pub use error::WmsError;
pub use feature::{AttributeValue, Feature, FeatureCollection, Property};
pub use geometry::{Coord, Geometry, Polygon};
