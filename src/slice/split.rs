use geo::{Coord, Polygon};
use smallvec::SmallVec;

use crate::error::EditError;
use crate::geom::{close_ring, closest_point_on_ring, distance, nearest_vertex, polygon_area, polygon_from_vertices, polygon_vertices};

/// Where a chord end point falls on a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Location {
    Vertex(usize),
    /// Inside segment `i` (from vertex `i` to the next one), at the given point.
    Edge(usize, Coord<f64>),
}

fn locate(vertices: &[Coord<f64>], p: Coord<f64>, eps: f64) -> Option<Location> {
    if let Some((i, d)) = nearest_vertex(p, vertices) {
        if d <= eps { return Some(Location::Vertex(i)) }
    }
    closest_point_on_ring(p, &close_ring(vertices).0)
        .filter(|hit| hit.distance <= eps)
        .map(|hit| Location::Edge(hit.segment, hit.coord))
}

/// Split a polygon in two along the chord `from`-`to`.
///
/// Both points must lie on the exterior ring within `eps`. Points on an
/// existing vertex reuse it; points inside an edge are spliced into the ring.
/// With `i <= j` the positions of the two points in the rebuilt ring, the
/// first piece is `[i..=j]` and the second `[j..] + [..=i]`.
pub fn split_polygon(polygon: &Polygon<f64>, from: Coord<f64>, to: Coord<f64>, eps: f64) -> Result<(Polygon<f64>, Polygon<f64>), EditError> {
    let vertices = polygon_vertices(polygon);
    let a = locate(vertices, from, eps).ok_or(EditError::SliceNotLocated)?;
    let b = locate(vertices, to, eps).ok_or(EditError::SliceNotLocated)?;

    let mut rebuilt: Vec<Coord<f64>> = Vec::with_capacity(vertices.len() + 2);
    let (mut ia, mut ib) = (None, None);
    for (k, &v) in vertices.iter().enumerate() {
        if a == Location::Vertex(k) { ia = Some(rebuilt.len()) }
        if b == Location::Vertex(k) { ib = Some(rebuilt.len()) }
        rebuilt.push(v);

        // Points spliced into segment k, nearest to its start first.
        let mut spliced: SmallVec<[(f64, Coord<f64>, bool); 2]> = SmallVec::new();
        for (loc, is_a) in [(a, true), (b, false)] {
            if let Location::Edge(segment, p) = loc {
                if segment == k { spliced.push((distance(v, p), p, is_a)) }
            }
        }
        spliced.sort_by(|x, y| x.0.total_cmp(&y.0));
        for (_, p, is_a) in spliced {
            if is_a { ia = Some(rebuilt.len()) } else { ib = Some(rebuilt.len()) }
            rebuilt.push(p);
        }
    }

    let (Some(ia), Some(ib)) = (ia, ib) else { return Err(EditError::SliceNotLocated) };
    let (i, j) = (ia.min(ib), ia.max(ib));
    if i == j || distance(rebuilt[i], rebuilt[j]) <= eps { return Err(EditError::SliceDegenerate) }

    let first = &rebuilt[i..=j];
    let second = rebuilt[j..].iter().chain(&rebuilt[..=i]).copied().collect::<Vec<_>>();

    let piece = |ring: &[Coord<f64>]| polygon_from_vertices(ring)
        .filter(|polygon| polygon_area(polygon) > eps)
        .ok_or(EditError::SliceDegenerate);
    Ok((piece(first)?, piece(&second)?))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::coord;

    use super::*;
    use crate::geom::is_structurally_valid;

    fn square() -> Polygon<f64> {
        polygon_from_vertices(&[coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }, coord! { x: 0.0, y: 10.0 }]).unwrap()
    }

    fn assert_conserved(polygon: &Polygon<f64>, a: &Polygon<f64>, b: &Polygon<f64>) {
        assert!(is_structurally_valid(a) && is_structurally_valid(b));
        assert_relative_eq!(polygon_area(a) + polygon_area(b), polygon_area(polygon), epsilon = 1e-9);
    }

    #[test]
    fn edge_to_edge() {
        let square = square();
        let (a, b) = split_polygon(&square, coord! { x: 4.0, y: 0.0 }, coord! { x: 6.0, y: 10.0 }, 1e-3).unwrap();
        assert_conserved(&square, &a, &b);
        assert_relative_eq!(polygon_area(&a), 50.0);
        assert_eq!(polygon_vertices(&a).len(), 4);
    }

    #[test]
    fn vertex_to_vertex_diagonal() {
        let square = square();
        let (a, b) = split_polygon(&square, coord! { x: 10.0, y: 10.0 }, coord! { x: 0.0, y: 0.0 }, 1e-3).unwrap();
        assert_conserved(&square, &a, &b);
        assert_eq!(polygon_vertices(&a).len(), 3);
        assert_eq!(polygon_vertices(&b).len(), 3);
    }

    #[test]
    fn vertex_to_edge_and_seam_segment() {
        let square = square();
        // (0, 4) lies on the closing segment from (0, 10) back to (0, 0).
        let (a, b) = split_polygon(&square, coord! { x: 10.0, y: 0.0 }, coord! { x: 0.0, y: 4.0 }, 1e-3).unwrap();
        assert_conserved(&square, &a, &b);
        assert_relative_eq!(polygon_area(&a).min(polygon_area(&b)), 20.0);
    }

    #[test]
    fn degenerate_chords_are_rejected() {
        let square = square();
        // Along an existing edge.
        assert_eq!(split_polygon(&square, coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, 1e-3), Err(EditError::SliceDegenerate));
        // Both ends inside the same edge.
        assert_eq!(split_polygon(&square, coord! { x: 2.0, y: 0.0 }, coord! { x: 8.0, y: 0.0 }, 1e-3), Err(EditError::SliceDegenerate));
        // Off the ring.
        assert_eq!(split_polygon(&square, coord! { x: 5.0, y: 5.0 }, coord! { x: 10.0, y: 5.0 }, 1e-3), Err(EditError::SliceNotLocated));
    }
}
