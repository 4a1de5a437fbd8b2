use std::fmt;

use geo::{BoundingRect, Coord, Geometry, LineString, Point, Polygon, Rect};

use crate::geom::open_slice;

/// Reference data layers fetched from the feature service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerType {
    Building,
    Road,
    Water,
    Rail,
}

impl LayerType {
    pub const ALL: [LayerType; 4] = [LayerType::Building, LayerType::Road, LayerType::Water, LayerType::Rail];

    /// Position in `IndexConfig::collections`.
    #[inline] pub fn ordinal(self) -> usize { self as usize }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerType::Building => "building",
            LayerType::Road => "road",
            LayerType::Water => "water",
            LayerType::Rail => "rail",
        })
    }
}

/// Single-part geometry of a reference feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Coord<f64>),
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl FeatureGeometry {
    /// All rings/paths whose segments are snappable.
    pub fn paths(&self) -> Vec<&[Coord<f64>]> {
        match self {
            FeatureGeometry::Point(_) => Vec::new(),
            FeatureGeometry::Line(line) => vec![&line.0],
            FeatureGeometry::Polygon(polygon) => std::iter::once(&polygon.exterior().0)
                .chain(polygon.interiors().iter().map(|ring| &ring.0))
                .map(|coords| coords.as_slice())
                .collect(),
        }
    }

    /// Snappable vertices (ring closing duplicates excluded).
    pub fn vertices(&self) -> Vec<Coord<f64>> {
        match self {
            FeatureGeometry::Point(p) => vec![*p],
            FeatureGeometry::Line(line) => line.0.clone(),
            FeatureGeometry::Polygon(_) => self.paths().into_iter()
                .flat_map(|ring| open_slice(ring).iter().copied())
                .collect(),
        }
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            FeatureGeometry::Point(p) => Some(Point::from(*p).bounding_rect()),
            FeatureGeometry::Line(line) => line.bounding_rect(),
            FeatureGeometry::Polygon(polygon) => polygon.bounding_rect(),
        }
    }

    /// The feature as a `geo::Geometry`.
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            FeatureGeometry::Point(p) => Geometry::Point(Point::from(*p)),
            FeatureGeometry::Line(line) => Geometry::LineString(line.clone()),
            FeatureGeometry::Polygon(polygon) => Geometry::Polygon(polygon.clone()),
        }
    }
}

/// An immutable feature from the reference data service.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFeature {
    pub layer: LayerType,
    pub id: Option<String>,
    pub geometry: FeatureGeometry,
}

impl ReferenceFeature {
    pub fn new(layer: LayerType, id: Option<String>, geometry: FeatureGeometry) -> Self {
        Self { layer, id, geometry }
    }

    /// The polygon, for polygonal features.
    #[inline]
    pub fn polygon(&self) -> Option<&Polygon<f64>> {
        match &self.geometry {
            FeatureGeometry::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }
}
