mod feature;
mod fetch;
mod refresh;
mod source;

pub use feature::{FeatureGeometry, LayerType, ReferenceFeature};
pub use fetch::fetch_reference_features;
pub use refresh::{RefreshScheduler, RefreshStatus};
pub use source::{parse_feature_collection, parse_geometry, FeaturePage, FeatureSource};
#[cfg(feature = "download")]
pub use source::HttpFeatureSource;
pub(crate) use source::{parse_coord, parse_polygon};

use geo::{BoundingRect, Coord, GeometryCollection, Rect};
use rstar::RTree;

use crate::geom::{closest_point_on_segment, distance, polygon_area, search_envelope, segments, Envelope};
use crate::validate::point_inside_or_on;

/// A point found on a reference feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureHit<'a> {
    pub coord: Coord<f64>,
    pub distance: f64,
    pub feature: &'a ReferenceFeature,
}

/// Reference features for the current viewport, with an R-tree over their extents.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    features: Vec<ReferenceFeature>,
    rtree: RTree<Envelope>,
}

impl Default for ReferenceIndex {
    fn default() -> Self { Self::new(Vec::new()) }
}

impl ReferenceIndex {
    /// Construct an index from a set of features in the working CRS.
    pub fn new(features: Vec<ReferenceFeature>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                features.iter().enumerate()
                    .filter_map(|(i, feature)| feature.geometry.bounds().map(|bbox| Envelope::new(i, bbox)))
                    .collect()
            ),
            features,
        }
    }

    /// Replace every feature at once; readers never see a mix of old and new.
    pub fn replace(&mut self, features: Vec<ReferenceFeature>) {
        *self = Self::new(features);
    }

    #[inline] pub fn clear(&mut self) { self.replace(Vec::new()) }

    /// Get the number of features.
    #[inline] pub fn len(&self) -> usize { self.features.len() }

    /// Check if there are no features.
    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Get a reference to the list of features.
    #[inline] pub fn features(&self) -> &[ReferenceFeature] { &self.features }

    /// Compute the bounding rectangle of all features.
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.features.iter()
            .map(|feature| feature.geometry.to_geometry())
            .collect::<GeometryCollection<f64>>()
            .bounding_rect()
    }

    /// Features whose extent comes within `radius` of `point`.
    #[inline]
    fn candidates(&self, point: Coord<f64>, radius: f64) -> impl Iterator<Item = &ReferenceFeature> {
        self.rtree.locate_in_envelope_intersecting(&search_envelope(point, radius))
            .map(|bb| &self.features[bb.idx()])
    }

    /// Closest point on any feature's edges (or on a point feature) within `tolerance`.
    pub fn nearest_point_on_any_feature(&self, point: Coord<f64>, tolerance: f64) -> Option<FeatureHit<'_>> {
        let mut best: Option<FeatureHit<'_>> = None;
        for feature in self.candidates(point, tolerance) {
            let closest = match &feature.geometry {
                FeatureGeometry::Point(p) => Some(*p),
                geometry => geometry.paths().into_iter()
                    .flat_map(|path| segments(path).map(|(a, b)| closest_point_on_segment(point, a, b)))
                    .min_by(|a, b| distance(point, *a).total_cmp(&distance(point, *b))),
            };
            let Some(coord) = closest else { continue };
            let d = distance(point, coord);
            if d <= tolerance && best.is_none_or(|hit| d < hit.distance) {
                best = Some(FeatureHit { coord, distance: d, feature });
            }
        }
        best
    }

    /// Closest feature vertex within `tolerance`.
    pub fn nearest_vertex(&self, point: Coord<f64>, tolerance: f64) -> Option<FeatureHit<'_>> {
        let mut best: Option<FeatureHit<'_>> = None;
        for feature in self.candidates(point, tolerance) {
            for coord in feature.geometry.vertices() {
                let d = distance(point, coord);
                if d <= tolerance && best.is_none_or(|hit| d < hit.distance) {
                    best = Some(FeatureHit { coord, distance: d, feature });
                }
            }
        }
        best
    }

    /// Every feature vertex within `tolerance` of `point`.
    pub fn vertices_within(&self, point: Coord<f64>, tolerance: f64) -> Vec<Coord<f64>> {
        self.candidates(point, tolerance)
            .flat_map(|feature| feature.geometry.vertices())
            .filter(|&v| distance(point, v) <= tolerance)
            .collect()
    }

    /// The smallest polygonal feature containing `point`.
    pub fn polygon_at(&self, point: Coord<f64>, eps: f64) -> Option<&ReferenceFeature> {
        self.candidates(point, eps)
            .filter(|feature| feature.polygon()
                .is_some_and(|polygon| point_inside_or_on(point, &polygon.exterior().0, eps)))
            .min_by(|a, b| {
                let area = |f: &ReferenceFeature| f.polygon().map(polygon_area).unwrap_or(f64::INFINITY);
                area(a).total_cmp(&area(b))
            })
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, LineString};

    use super::*;
    use crate::geom::polygon_from_vertices;

    fn sample_index() -> ReferenceIndex {
        let building = polygon_from_vertices(&[
            coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }, coord! { x: 0.0, y: 10.0 },
        ]).unwrap();
        let yard = polygon_from_vertices(&[
            coord! { x: -5.0, y: -5.0 }, coord! { x: 20.0, y: -5.0 }, coord! { x: 20.0, y: 20.0 }, coord! { x: -5.0, y: 20.0 },
        ]).unwrap();
        let road = LineString(vec![coord! { x: 0.0, y: 30.0 }, coord! { x: 50.0, y: 30.0 }]);
        ReferenceIndex::new(vec![
            ReferenceFeature::new(LayerType::Building, Some("house".into()), FeatureGeometry::Polygon(building)),
            ReferenceFeature::new(LayerType::Building, Some("yard".into()), FeatureGeometry::Polygon(yard)),
            ReferenceFeature::new(LayerType::Road, None, FeatureGeometry::Line(road)),
            ReferenceFeature::new(LayerType::Water, None, FeatureGeometry::Point(coord! { x: 40.0, y: 40.0 })),
        ])
    }

    #[test]
    fn nearest_edge_point_within_tolerance() {
        let index = sample_index();
        let hit = index.nearest_point_on_any_feature(coord! { x: 25.0, y: 31.5 }, 2.0).unwrap();
        assert_eq!(hit.coord, coord! { x: 25.0, y: 30.0 });
        assert_eq!(hit.feature.layer, LayerType::Road);
        assert!(index.nearest_point_on_any_feature(coord! { x: 25.0, y: 35.0 }, 2.0).is_none());

        let hit = index.nearest_point_on_any_feature(coord! { x: 41.0, y: 40.0 }, 2.0).unwrap();
        assert_eq!(hit.feature.layer, LayerType::Water);
    }

    #[test]
    fn vertex_queries() {
        let index = sample_index();
        let hit = index.nearest_vertex(coord! { x: 10.5, y: 9.0 }, 2.0).unwrap();
        assert_eq!(hit.coord, coord! { x: 10.0, y: 10.0 });
        assert_eq!(index.vertices_within(coord! { x: 0.0, y: 0.0 }, 1.0), vec![coord! { x: 0.0, y: 0.0 }]);
        assert!(index.vertices_within(coord! { x: 5.0, y: 5.0 }, 1.0).is_empty());
    }

    #[test]
    fn polygon_at_prefers_smallest() {
        let index = sample_index();
        assert_eq!(index.polygon_at(coord! { x: 5.0, y: 5.0 }, 1e-6).unwrap().id.as_deref(), Some("house"));
        assert_eq!(index.polygon_at(coord! { x: 15.0, y: 15.0 }, 1e-6).unwrap().id.as_deref(), Some("yard"));
        assert!(index.polygon_at(coord! { x: 30.0, y: 30.0 }, 1e-6).is_none());
    }

    #[test]
    fn extent_covers_every_layer() {
        let extent = sample_index().extent().unwrap();
        assert_eq!(extent.min(), coord! { x: -5.0, y: -5.0 });
        assert_eq!(extent.max(), coord! { x: 50.0, y: 40.0 });
    }

    #[test]
    fn replace_swaps_everything() {
        let mut index = sample_index();
        assert_eq!(index.len(), 4);
        index.replace(Vec::new());
        assert!(index.is_empty());
        assert!(index.nearest_vertex(coord! { x: 0.0, y: 0.0 }, 5.0).is_none());
        assert!(index.extent().is_none());
    }
}
