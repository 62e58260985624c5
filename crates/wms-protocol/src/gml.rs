//! GML 2 feature collection output.
//!
//! Encodes a WFS GetFeature response as a `wfs:FeatureCollection` document
//! (GML 2.1.2). The encoder takes its per-collection `srsName` from the
//! queries of the operation it is invoked through.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use tracing::debug;

use wms_common::{AttributeValue, BoundingBox, Coord, Feature, Geometry, Polygon};

use crate::settings::GmlSettings;
use crate::wfs::{FeatureCollectionResponse, Operation, SrsName};

/// MIME type of plain WFS GML 2 output.
pub const GML2_MIME: &str = "text/xml; subtype=gml/2.1.2";

pub const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs";
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml";

/// Property element holding a feature's default geometry.
pub const GEOMETRY_PROPERTY: &str = "the_geom";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("I/O error while writing GML: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error while writing GML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Request has {queries} queries for {collections} feature collections")]
    QueryMismatch { queries: usize, collections: usize },

    #[error("'{0}' cannot be used as an XML element name")]
    InvalidName(String),
}

/// An output format that serializes a feature collection response.
pub trait FeatureCollectionEncoder {
    fn encode(
        &self,
        collection: &FeatureCollectionResponse<'_>,
        out: &mut dyn Write,
        operation: &Operation<'_>,
    ) -> Result<(), EncodeError>;
}

/// GML 2.1.2 encoder.
#[derive(Debug, Clone, Default)]
pub struct Gml2Encoder {
    settings: GmlSettings,
}

type GmlWriter<'w> = Writer<&'w mut dyn Write>;

impl Gml2Encoder {
    pub fn new(settings: GmlSettings) -> Self {
        Self { settings }
    }

    /// Element name in the feature namespace. Layer and property names
    /// come from data sources and are rejected unless they are NCNames.
    fn qualified(&self, local: &str) -> Result<String, EncodeError> {
        // drop any prefix the layer name already carries
        let local = local.rsplit(':').next().unwrap_or(local);
        if !is_ncname(local) {
            return Err(EncodeError::InvalidName(local.to_string()));
        }
        Ok(format!("{}:{}", self.settings.namespace_prefix, local))
    }

    fn write_bounded_by(
        &self,
        w: &mut GmlWriter<'_>,
        collection: &FeatureCollectionResponse<'_>,
        srs_names: &[Option<&SrsName>],
    ) -> Result<(), EncodeError> {
        w.write_event(Event::Start(BytesStart::new("gml:boundedBy")))?;

        let bounds = if self.settings.feature_bounding {
            response_bounds(collection)
        } else {
            None
        };

        match bounds {
            Some(bbox) => {
                let mut start = BytesStart::new("gml:Box");
                if let Some(srs) = common_srs_name(srs_names) {
                    start.push_attribute(("srsName", srs.as_str()));
                }
                w.write_event(Event::Start(start))?;
                self.write_coordinates(
                    w,
                    [
                        Coord::new(bbox.min_x, bbox.min_y),
                        Coord::new(bbox.max_x, bbox.max_y),
                    ]
                    .iter(),
                )?;
                w.write_event(Event::End(BytesEnd::new("gml:Box")))?;
            }
            None => write_text_element(w, "gml:null", "unknown")?,
        }

        w.write_event(Event::End(BytesEnd::new("gml:boundedBy")))?;
        Ok(())
    }

    fn write_feature(
        &self,
        w: &mut GmlWriter<'_>,
        type_name: &str,
        index: usize,
        feature: &Feature,
        srs_name: Option<&SrsName>,
    ) -> Result<(), EncodeError> {
        let element = self.qualified(type_name)?;
        let fid = if feature.id.is_empty() {
            format!("{}.{}", type_name.rsplit(':').next().unwrap_or(type_name), index + 1)
        } else {
            feature.id.clone()
        };

        w.write_event(Event::Start(BytesStart::new("gml:featureMember")))?;
        let mut start = BytesStart::new(element.as_str());
        start.push_attribute(("fid", fid.as_str()));
        w.write_event(Event::Start(start))?;

        if let Some(geometry) = &feature.geometry {
            let property = self.qualified(GEOMETRY_PROPERTY)?;
            w.write_event(Event::Start(BytesStart::new(property.as_str())))?;
            self.write_geometry(w, geometry, srs_name)?;
            w.write_event(Event::End(BytesEnd::new(property.as_str())))?;
        }

        for prop in &feature.properties {
            let name = self.qualified(&prop.name)?;
            match &prop.value {
                AttributeValue::Null => {
                    w.write_event(Event::Empty(BytesStart::new(name.as_str())))?;
                }
                AttributeValue::Double(d) => {
                    write_text_element(w, &name, &format_ordinate(*d, self.settings.num_decimals))?;
                }
                value => write_text_element(w, &name, &value.to_string())?,
            }
        }

        w.write_event(Event::End(BytesEnd::new(element.as_str())))?;
        w.write_event(Event::End(BytesEnd::new("gml:featureMember")))?;
        Ok(())
    }

    fn write_geometry(
        &self,
        w: &mut GmlWriter<'_>,
        geometry: &Geometry,
        srs_name: Option<&SrsName>,
    ) -> Result<(), EncodeError> {
        let tag = format!("gml:{}", geometry.gml_name());
        let mut start = BytesStart::new(tag.as_str());
        if let Some(srs) = srs_name {
            start.push_attribute(("srsName", srs.as_str()));
        }
        w.write_event(Event::Start(start))?;

        match geometry {
            Geometry::Point(c) => self.write_coordinates(w, std::iter::once(c))?,
            Geometry::LineString(cs) => self.write_coordinates(w, cs.iter())?,
            Geometry::Polygon(p) => self.write_polygon_rings(w, p)?,
            Geometry::MultiPoint(points) => {
                for c in points {
                    self.write_member(w, "gml:pointMember", "gml:Point", |enc, w| {
                        enc.write_coordinates(w, std::iter::once(c))
                    })?;
                }
            }
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.write_member(w, "gml:lineStringMember", "gml:LineString", |enc, w| {
                        enc.write_coordinates(w, line.iter())
                    })?;
                }
            }
            Geometry::MultiPolygon(polys) => {
                for p in polys {
                    self.write_member(w, "gml:polygonMember", "gml:Polygon", |enc, w| {
                        enc.write_polygon_rings(w, p)
                    })?;
                }
            }
        }

        w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }

    fn write_member<F>(
        &self,
        w: &mut GmlWriter<'_>,
        member: &str,
        geometry: &str,
        body: F,
    ) -> Result<(), EncodeError>
    where
        F: FnOnce(&Self, &mut GmlWriter<'_>) -> Result<(), EncodeError>,
    {
        w.write_event(Event::Start(BytesStart::new(member)))?;
        w.write_event(Event::Start(BytesStart::new(geometry)))?;
        body(self, w)?;
        w.write_event(Event::End(BytesEnd::new(geometry)))?;
        w.write_event(Event::End(BytesEnd::new(member)))?;
        Ok(())
    }

    fn write_polygon_rings(&self, w: &mut GmlWriter<'_>, polygon: &Polygon) -> Result<(), EncodeError> {
        self.write_member(w, "gml:outerBoundaryIs", "gml:LinearRing", |enc, w| {
            enc.write_coordinates(w, polygon.exterior.iter())
        })?;
        for hole in &polygon.interiors {
            self.write_member(w, "gml:innerBoundaryIs", "gml:LinearRing", |enc, w| {
                enc.write_coordinates(w, hole.iter())
            })?;
        }
        Ok(())
    }

    fn write_coordinates<'c>(
        &self,
        w: &mut GmlWriter<'_>,
        coords: impl Iterator<Item = &'c Coord>,
    ) -> Result<(), EncodeError> {
        let decimals = self.settings.num_decimals;
        let text = coords
            .map(|c| {
                format!(
                    "{},{}",
                    format_ordinate(c.x, decimals),
                    format_ordinate(c.y, decimals)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut start = BytesStart::new("gml:coordinates");
        start.push_attribute(("decimal", "."));
        start.push_attribute(("cs", ","));
        start.push_attribute(("ts", " "));
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Text(BytesText::new(&text)))?;
        w.write_event(Event::End(BytesEnd::new("gml:coordinates")))?;
        Ok(())
    }
}

impl FeatureCollectionEncoder for Gml2Encoder {
    fn encode(
        &self,
        collection: &FeatureCollectionResponse<'_>,
        out: &mut dyn Write,
        operation: &Operation<'_>,
    ) -> Result<(), EncodeError> {
        let queries = &operation.request.queries;
        if queries.len() != collection.len() {
            return Err(EncodeError::QueryMismatch {
                queries: queries.len(),
                collections: collection.len(),
            });
        }

        if !is_ncname(&self.settings.namespace_prefix) {
            return Err(EncodeError::InvalidName(self.settings.namespace_prefix.clone()));
        }

        let srs_names: Vec<Option<&SrsName>> =
            queries.iter().map(|q| q.srs_name.as_ref()).collect();

        debug!(
            service = %operation.service.id,
            collections = collection.len(),
            base_url = %operation.request.base_url,
            "Encoding GML 2 feature collection"
        );

        let mut w: GmlWriter<'_> = if self.settings.indent {
            Writer::new_with_indent(out, b' ', 2)
        } else {
            Writer::new(out)
        };

        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("wfs:FeatureCollection");
        root.push_attribute(("xmlns:wfs", WFS_NAMESPACE));
        root.push_attribute(("xmlns:gml", GML_NAMESPACE));
        let feature_ns = format!("xmlns:{}", self.settings.namespace_prefix);
        root.push_attribute((feature_ns.as_str(), self.settings.namespace_uri.as_str()));
        w.write_event(Event::Start(root))?;

        self.write_bounded_by(&mut w, collection, &srs_names)?;

        for (fc, srs_name) in collection.features.iter().zip(&srs_names) {
            for (index, feature) in fc.features.iter().enumerate() {
                self.write_feature(&mut w, &fc.name, index, feature, *srs_name)?;
            }
        }

        w.write_event(Event::End(BytesEnd::new("wfs:FeatureCollection")))?;
        w.into_inner().flush()?;
        Ok(())
    }
}

fn write_text_element(w: &mut GmlWriter<'_>, name: &str, text: &str) -> Result<(), EncodeError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// XML non-colonized name: a letter or `_`, then letters, digits, `-`, `_`
/// or `.`.
fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// The srsName shared by every collection that has one, if they agree.
fn common_srs_name<'a>(srs_names: &[Option<&'a SrsName>]) -> Option<&'a SrsName> {
    let mut known = srs_names.iter().flatten();
    let first = *known.next()?;
    known.all(|s| s.as_str() == first.as_str()).then_some(first)
}

/// Print an ordinate with at most `decimals` fractional digits, without
/// trailing zeros.
pub fn format_ordinate(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Envelope of every collection in a response.
pub fn response_bounds(collection: &FeatureCollectionResponse<'_>) -> Option<BoundingBox> {
    wms_common::bbox::union_all(collection.features.iter().map(|fc| fc.bounds()))
}
