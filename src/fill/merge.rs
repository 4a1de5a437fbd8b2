use ahash::AHashMap;
use geo::{Coord, Polygon};
use log::debug;

use crate::geom::{convex_hull, distinct_vertex_count, ensure_ccw, polygon_from_vertices, polygon_vertices};

type Key = (u64, u64);

/// Exact coordinate key; `-0.0` and `0.0` map to the same key.
#[inline]
fn key(c: Coord<f64>) -> Key { ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()) }

/// Directed edges left after cancelling every edge against its exact reverse.
fn outer_edges(polygons: &[&Polygon<f64>]) -> Vec<(Coord<f64>, Coord<f64>)> {
    let mut edges: Vec<(Coord<f64>, Coord<f64>)> = Vec::new();
    let mut live: Vec<bool> = Vec::new();
    let mut open: AHashMap<(Key, Key), Vec<usize>> = AHashMap::new();

    for polygon in polygons {
        let mut ring = polygon_vertices(polygon).to_vec();
        ensure_ccw(&mut ring);
        let n = ring.len();
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if key(a) == key(b) { continue }

            let reverse = open.get_mut(&(key(b), key(a))).and_then(|idxs| idxs.pop());
            match reverse {
                Some(j) => live[j] = false,
                None => {
                    open.entry((key(a), key(b))).or_default().push(edges.len());
                    edges.push((a, b));
                    live.push(true);
                }
            }
        }
    }

    edges.into_iter().zip(live)
        .filter_map(|(edge, live)| live.then_some(edge))
        .collect()
}

/// Walk the outer edges end-to-start into one ring.
/// Returns `None` if the walk dead-ends, exceeds twice the edge count, or
/// closes before every outer edge is used.
fn stitch(edges: &[(Coord<f64>, Coord<f64>)]) -> Option<Vec<Coord<f64>>> {
    let (start, mut current) = *edges.first()?;

    let mut by_start: AHashMap<Key, Vec<usize>> = AHashMap::new();
    for (i, (a, _)) in edges.iter().enumerate().skip(1).rev() {
        by_start.entry(key(*a)).or_default().push(i);
    }

    let mut ring = vec![start];
    for _ in 0..2 * edges.len() {
        if key(current) == key(start) {
            return (ring.len() == edges.len() && distinct_vertex_count(&ring) >= 3).then_some(ring)
        }
        ring.push(current);
        let next = by_start.get_mut(&key(current)).and_then(|idxs| idxs.pop())?;
        current = edges[next].1;
    }
    None
}

/// Merge polygons into one by cancelling shared edges.
///
/// A single polygon is returned as is. If the outer edges do not stitch into
/// one closed ring, the convex hull of every input vertex is returned instead.
pub fn merge_polygons(polygons: &[&Polygon<f64>]) -> Option<Polygon<f64>> {
    match polygons {
        [] => return None,
        [single] => return Some((*single).clone()),
        _ => {}
    }

    let edges = outer_edges(polygons);
    if let Some(mut ring) = stitch(&edges) {
        ensure_ccw(&mut ring);
        if let Some(merged) = polygon_from_vertices(&ring) { return Some(merged) }
    }

    debug!("[fill] edge stitching failed for {} polygons, using convex hull", polygons.len());
    let points = polygons.iter()
        .flat_map(|p| polygon_vertices(p).iter().copied())
        .collect::<Vec<_>>();
    convex_hull(&points)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::coord;

    use super::*;
    use crate::geom::{polygon_area, signed_area};

    fn square(x: f64, y: f64) -> Polygon<f64> {
        polygon_from_vertices(&[
            coord! { x: x, y: y }, coord! { x: x + 1.0, y: y },
            coord! { x: x + 1.0, y: y + 1.0 }, coord! { x: x, y: y + 1.0 },
        ]).unwrap()
    }

    #[test]
    fn shared_edge_cancels() {
        let (a, b) = (square(0.0, 0.0), square(1.0, 0.0));
        let merged = merge_polygons(&[&a, &b]).unwrap();
        let ring = polygon_vertices(&merged);

        assert_relative_eq!(polygon_area(&merged), 2.0);
        assert_eq!(ring.len(), 6);
        // The shared edge (1,0)-(1,1) is gone: no edge joins those two points.
        let shared = (coord! { x: 1.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        assert!(ring.windows(2).all(|w| (w[0], w[1]) != shared && (w[1], w[0]) != shared));
        assert!(signed_area(ring) > 0.0);
    }

    #[test]
    fn orientation_does_not_matter() {
        let a = square(0.0, 0.0);
        let mut b = polygon_vertices(&square(0.0, 1.0)).to_vec();
        b.reverse();
        let b = polygon_from_vertices(&b).unwrap();
        assert_relative_eq!(polygon_area(&merge_polygons(&[&a, &b]).unwrap()), 2.0);
    }

    #[test]
    fn l_shape_of_three() {
        let (a, b, c) = (square(0.0, 0.0), square(1.0, 0.0), square(0.0, 1.0));
        let merged = merge_polygons(&[&a, &b, &c]).unwrap();
        assert_relative_eq!(polygon_area(&merged), 3.0);
    }

    #[test]
    fn disjoint_polygons_fall_back_to_hull() {
        let (a, b) = (square(0.0, 0.0), square(3.0, 0.0));
        let merged = merge_polygons(&[&a, &b]).unwrap();
        assert_relative_eq!(polygon_area(&merged), 4.0);
        assert_eq!(polygon_vertices(&merged).len(), 4);
    }

    #[test]
    fn single_polygon_is_cloned() {
        let a = square(5.0, 5.0);
        assert_eq!(merge_polygons(&[&a]), Some(a));
        assert_eq!(merge_polygons(&[]), None);
    }
}
