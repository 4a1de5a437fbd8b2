use geo::{BoundingRect, Coord, InteriorPoint, Polygon};

use crate::geom::{cross, distance, extent_contains, midpoint, polygon_vertices, segments};
use super::point::{point_inside_or_on, point_strictly_inside_polygon};

/// Orientation of `c` relative to the line through `a`-`b`: -1, 0 or 1.
/// Points within `eps` of the line count as collinear.
#[inline]
fn orientation(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, eps: f64) -> i8 {
    let len = distance(a, b);
    let value = cross(a, b, c);
    if value.abs() <= eps * len.max(eps) { 0 } else if value > 0.0 { 1 } else { -1 }
}

/// Check whether segments `a1`-`a2` and `b1`-`b2` cross transversally.
/// Collinear overlaps and touching endpoints do not count.
pub fn segments_properly_intersect(a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>, eps: f64) -> bool {
    let o1 = orientation(a1, a2, b1, eps);
    let o2 = orientation(a1, a2, b2, eps);
    let o3 = orientation(b1, b2, a1, eps);
    let o4 = orientation(b1, b2, a2, eps);

    if o1 == 0 || o2 == 0 || o3 == 0 || o4 == 0 { return false }
    o1 != o2 && o3 != o4
}

/// Vertices and edge midpoints of a polygon: the sample set used by the
/// containment and overlap predicates.
fn sample_points(polygon: &Polygon<f64>) -> impl Iterator<Item = Coord<f64>> + '_ {
    polygon_vertices(polygon).iter().copied()
        .chain(segments(&polygon.exterior().0).map(|(a, b)| midpoint(a, b)))
}

/// Check that every vertex and every edge midpoint of `inner` is inside or
/// on `outer`. Midpoints catch edges that bow out without any vertex doing so.
pub fn polygon_within_boundary(inner: &Polygon<f64>, outer: &Polygon<f64>, eps: f64) -> bool {
    let (Some(inner_ext), Some(outer_ext)) = (inner.bounding_rect(), outer.bounding_rect())
        else { return false };
    if !extent_contains(&outer_ext, &inner_ext, eps) { return false }

    let ring = &outer.exterior().0;
    sample_points(inner).all(|p| point_inside_or_on(p, ring, eps))
}

/// Check whether two polygons share interior area.
///
/// True when any vertex or edge midpoint of either polygon lies strictly
/// inside the other, when an interior point of one lies strictly inside the
/// other (identical or coincident-vertex polygons), or when any edge pair
/// crosses properly. Shared edges and touching corners are not overlaps.
pub fn polygons_overlap(a: &Polygon<f64>, b: &Polygon<f64>, eps: f64) -> bool {
    let (Some(ext_a), Some(ext_b)) = (a.bounding_rect(), b.bounding_rect())
        else { return false };
    if ext_a.max().x < ext_b.min().x - eps || ext_b.max().x < ext_a.min().x - eps
        || ext_a.max().y < ext_b.min().y - eps || ext_b.max().y < ext_a.min().y - eps {
        return false
    }

    let (ring_a, ring_b) = (a.exterior().0.as_slice(), b.exterior().0.as_slice());

    if sample_points(a).any(|p| point_strictly_inside_polygon(p, ring_b, eps)) { return true }
    if sample_points(b).any(|p| point_strictly_inside_polygon(p, ring_a, eps)) { return true }

    let interior_inside = |from: &Polygon<f64>, ring: &[Coord<f64>]| from.interior_point()
        .is_some_and(|p| point_strictly_inside_polygon(p.0, ring, eps));
    if interior_inside(a, ring_b) || interior_inside(b, ring_a) { return true }

    segments(ring_a).any(|(a1, a2)| segments(ring_b)
        .any(|(b1, b2)| segments_properly_intersect(a1, a2, b1, b2, eps)))
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;
    use crate::geom::polygon_from_vertices;

    const EPS: f64 = 1e-6;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon_from_vertices(&[coord! { x: x0, y: y0 }, coord! { x: x1, y: y0 }, coord! { x: x1, y: y1 }, coord! { x: x0, y: y1 }]).unwrap()
    }

    #[test]
    fn proper_crossing_only() {
        let o = coord! { x: 0.0, y: 0.0 };
        assert!(segments_properly_intersect(o, coord! { x: 2.0, y: 2.0 }, coord! { x: 0.0, y: 2.0 }, coord! { x: 2.0, y: 0.0 }, EPS));
        // Shared endpoint.
        assert!(!segments_properly_intersect(o, coord! { x: 2.0, y: 0.0 }, o, coord! { x: 0.0, y: 2.0 }, EPS));
        // Collinear overlap.
        assert!(!segments_properly_intersect(o, coord! { x: 2.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, coord! { x: 3.0, y: 0.0 }, EPS));
        // T-junction.
        assert!(!segments_properly_intersect(o, coord! { x: 2.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, coord! { x: 1.0, y: 2.0 }, EPS));
    }

    #[test]
    fn shared_edge_is_not_overlap() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        assert!(!polygons_overlap(&a, &b, EPS));
        assert!(!polygons_overlap(&b, &a, EPS));
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (rect(0.0, 0.0, 2.0, 2.0), rect(1.0, 1.0, 3.0, 3.0), true),
            (rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 2.0, 2.0), true),
            (rect(0.0, 0.0, 1.0, 1.0), rect(0.0, 0.0, 1.0, 1.0), true),
            (rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 1.0, 2.0, 2.0), false),
            (rect(0.0, 0.0, 1.0, 1.0), rect(5.0, 5.0, 6.0, 6.0), false),
            // Cross shape: no vertex of either inside the other.
            (rect(0.0, 1.0, 3.0, 2.0), rect(1.0, 0.0, 2.0, 3.0), true),
        ];
        for (a, b, expected) in cases {
            assert_eq!(polygons_overlap(&a, &b, EPS), expected);
            assert_eq!(polygons_overlap(&b, &a, EPS), expected);
        }
    }

    #[test]
    fn within_boundary_uses_midpoints() {
        let outer = rect(0.0, 0.0, 10.0, 10.0);
        assert!(polygon_within_boundary(&rect(0.0, 0.0, 5.0, 5.0), &outer, EPS));
        assert!(!polygon_within_boundary(&rect(0.0, 0.0, 11.0, 5.0), &outer, EPS));

        // L-shaped boundary: a quadrilateral spanning the notch keeps its vertices
        // inside but its edge midpoints fall in the cut-out.
        let l_shape = polygon_from_vertices(&[
            coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 10.0, y: 4.0 },
            coord! { x: 4.0, y: 4.0 }, coord! { x: 4.0, y: 10.0 }, coord! { x: 0.0, y: 10.0 },
        ]).unwrap();
        let bowing = polygon_from_vertices(&[
            coord! { x: 2.0, y: 2.0 }, coord! { x: 8.0, y: 2.0 }, coord! { x: 2.0, y: 8.0 }, coord! { x: 2.0, y: 5.0 },
        ]).unwrap();
        assert!(!polygon_within_boundary(&bowing, &l_shape, EPS));
    }
}
