use geo::{Coord, Polygon};

use crate::geom::{closest_point_on_ring, nearest_vertex, polygon_from_vertices, polygon_vertices};

/// Pull a single coordinate onto the boundary: the nearest boundary vertex
/// within `tol`, else the nearest point on a boundary edge within `tol`.
pub fn snap_to_boundary(p: Coord<f64>, boundary: &Polygon<f64>, tol: f64) -> Coord<f64> {
    let ring = &boundary.exterior().0;
    if let Some((i, d)) = nearest_vertex(p, ring) {
        if d <= tol { return ring[i] }
    }
    match closest_point_on_ring(p, ring) {
        Some(hit) if hit.distance <= tol => hit.coord,
        _ => p,
    }
}

/// Snap each parcel vertex onto the boundary to remove floating-point drift.
/// Returns an unchanged copy if snapping would collapse the ring.
pub fn correct_geometry_to_boundary(parcel: &Polygon<f64>, boundary: &Polygon<f64>, tol: f64) -> Polygon<f64> {
    let corrected = polygon_vertices(parcel).iter()
        .map(|&p| snap_to_boundary(p, boundary, tol))
        .collect::<Vec<_>>();

    polygon_from_vertices(&corrected).unwrap_or_else(|| parcel.clone())
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon_from_vertices(&[coord! { x: x0, y: y0 }, coord! { x: x1, y: y0 }, coord! { x: x1, y: y1 }, coord! { x: x0, y: y1 }]).unwrap()
    }

    #[test]
    fn drifted_vertices_land_on_boundary() {
        let boundary = rect(0.0, 0.0, 10.0, 10.0);
        let parcel = polygon_from_vertices(&[
            coord! { x: 0.0001, y: -0.0002 },  // near a boundary vertex
            coord! { x: 5.0, y: 0.0003 },      // near a boundary edge
            coord! { x: 5.0, y: 5.0 },         // far from everything
            coord! { x: -0.0001, y: 5.0 },
        ]).unwrap();

        let corrected = correct_geometry_to_boundary(&parcel, &boundary, 0.5);
        assert_eq!(polygon_vertices(&corrected), &[
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 5.0, y: 0.0 },
            coord! { x: 5.0, y: 5.0 },
            coord! { x: 0.0, y: 5.0 },
        ]);
    }

    #[test]
    fn collapsing_correction_is_refused() {
        let boundary = rect(0.0, 0.0, 10.0, 10.0);
        let sliver = polygon_from_vertices(&[
            coord! { x: 0.1, y: 0.0 }, coord! { x: 0.2, y: 0.1 }, coord! { x: 0.0, y: 0.1 },
        ]).unwrap();
        assert_eq!(correct_geometry_to_boundary(&sliver, &boundary, 0.5), sliver);
    }
}
