use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};

/// Axis-aligned map extent in working-CRS units.
pub type Extent = Rect<f64>;

/// A bounding box in an R-tree, associated with a reference feature by index.
#[derive(Debug, Clone)]
pub(crate) struct Envelope {
    idx: usize, // Index of corresponding feature in the index
    bbox: Rect<f64>,
}

impl Envelope {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding feature.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for Envelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Search envelope around `point`, padded by `radius` on every side.
#[inline]
pub(crate) fn search_envelope(point: Coord<f64>, radius: f64) -> AABB<[f64; 2]> {
    AABB::from_corners([point.x - radius, point.y - radius], [point.x + radius, point.y + radius])
}

/// Check whether `inner` lies inside `outer`, padded by `tol`.
#[inline]
pub fn extent_contains(outer: &Extent, inner: &Extent, tol: f64) -> bool {
    inner.min().x >= outer.min().x - tol && inner.min().y >= outer.min().y - tol
        && inner.max().x <= outer.max().x + tol && inner.max().y <= outer.max().y + tol
}

/// Check whether two extents are equal within `tol`.
#[inline]
pub fn extent_eq(a: &Extent, b: &Extent, tol: f64) -> bool {
    (a.min().x - b.min().x).abs() <= tol && (a.min().y - b.min().y).abs() <= tol
        && (a.max().x - b.max().x).abs() <= tol && (a.max().y - b.max().y).abs() <= tol
}
