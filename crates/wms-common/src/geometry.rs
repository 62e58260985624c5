//! Simple-feature geometries carried by feature-info results.
//!
//! Geometries are passed through as-is: nothing here validates rings or
//! reprojects coordinates.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// A single x/y position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A polygon: one exterior ring and any number of holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Coord>,
    #[serde(default)]
    pub interiors: Vec<Vec<Coord>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Coord>) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    fn coords(&self) -> impl Iterator<Item = &Coord> {
        self.exterior.iter().chain(self.interiors.iter().flatten())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// GML 2 element name for this geometry type.
    pub fn gml_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Envelope of all coordinates, `None` for an empty geometry.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut coords: Box<dyn Iterator<Item = &Coord> + '_> = match self {
            Geometry::Point(c) => Box::new(std::iter::once(c)),
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => Box::new(cs.iter()),
            Geometry::Polygon(p) => Box::new(p.coords()),
            Geometry::MultiLineString(lines) => Box::new(lines.iter().flatten()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flat_map(Polygon::coords)),
        };

        let first = coords.next()?;
        let mut bbox = BoundingBox::from_point(first.x, first.y);
        for c in coords {
            bbox.expand_to_include(c.x, c.y);
        }
        Some(bbox)
    }
}
