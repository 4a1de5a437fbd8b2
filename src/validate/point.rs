use geo::Coord;

use crate::geom::{closest_point_on_segment, distance, segments};

/// Check if `p` lies on the segment `a`-`b`, within `eps`.
#[inline]
pub fn point_on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, eps: f64) -> bool {
    distance(p, closest_point_on_segment(p, a, b)) <= eps
}

/// Check if `p` lies on the closed ring, within `eps`.
pub fn point_on_polygon_boundary(p: Coord<f64>, ring: &[Coord<f64>], eps: f64) -> bool {
    segments(ring).any(|(a, b)| point_on_segment(p, a, b, eps))
}

/// Ray-casting containment that never counts boundary points as inside.
pub fn point_strictly_inside_polygon(p: Coord<f64>, ring: &[Coord<f64>], eps: f64) -> bool {
    if point_on_polygon_boundary(p, ring, eps) { return false }

    let mut inside = false;
    for (a, b) in segments(ring) {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x { inside = !inside }
        }
    }
    inside
}

/// Check if `p` is inside the ring or on its boundary.
#[inline]
pub fn point_inside_or_on(p: Coord<f64>, ring: &[Coord<f64>], eps: f64) -> bool {
    point_on_polygon_boundary(p, ring, eps) || point_strictly_inside_polygon(p, ring, eps)
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;
    use crate::geom::close_ring;

    fn square() -> Vec<Coord<f64>> {
        close_ring(&[coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 0.0 }, coord! { x: 4.0, y: 4.0 }, coord! { x: 0.0, y: 4.0 }]).0
    }

    #[test]
    fn boundary_points_are_not_inside() {
        let ring = square();
        let eps = 1e-6;
        assert!(point_on_polygon_boundary(coord! { x: 2.0, y: 0.0 }, &ring, eps));
        assert!(!point_strictly_inside_polygon(coord! { x: 2.0, y: 0.0 }, &ring, eps));
        assert!(!point_strictly_inside_polygon(coord! { x: 0.0, y: 0.0 }, &ring, eps));
        assert!(point_inside_or_on(coord! { x: 4.0, y: 4.0 }, &ring, eps));
    }

    #[test]
    fn ray_casting_inside_and_outside() {
        let ring = square();
        let eps = 1e-6;
        assert!(point_strictly_inside_polygon(coord! { x: 1.0, y: 3.0 }, &ring, eps));
        assert!(!point_strictly_inside_polygon(coord! { x: 5.0, y: 3.0 }, &ring, eps));
        assert!(!point_strictly_inside_polygon(coord! { x: -1.0, y: 0.0 }, &ring, eps));
    }

    #[test]
    fn segment_tolerance() {
        let (a, b) = (coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 });
        assert!(point_on_segment(coord! { x: 5.0, y: 0.0005 }, a, b, 1e-3));
        assert!(!point_on_segment(coord! { x: 5.0, y: 0.01 }, a, b, 1e-3));
        assert!(!point_on_segment(coord! { x: 10.01, y: 0.0 }, a, b, 1e-3));
    }
}
