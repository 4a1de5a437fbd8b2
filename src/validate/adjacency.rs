use std::collections::VecDeque;

use geo::{Coord, Polygon};

use crate::geom::{distance, polygon_vertices, segments};
use super::point::point_on_segment;

/// Length of the collinear overlap between segments `a1`-`a2` and `b1`-`b2`,
/// or zero when they are not collinear within `eps`.
fn collinear_overlap(a1: Coord<f64>, a2: Coord<f64>, b1: Coord<f64>, b2: Coord<f64>, eps: f64) -> f64 {
    let len = distance(a1, a2);
    if len <= eps { return 0.0 }

    // Both endpoints of b must lie on the infinite line through a.
    let (ux, uy) = ((a2.x - a1.x) / len, (a2.y - a1.y) / len);
    let offset = |p: Coord<f64>| ((p.x - a1.x) * uy - (p.y - a1.y) * ux).abs();
    if offset(b1) > eps || offset(b2) > eps { return 0.0 }

    // Project b onto a and intersect the parameter intervals.
    let project = |p: Coord<f64>| (p.x - a1.x) * ux + (p.y - a1.y) * uy;
    let (t1, t2) = (project(b1), project(b2));
    let (lo, hi) = (t1.min(t2).max(0.0), t1.max(t2).min(len));
    (hi - lo).max(0.0)
}

/// Total length of boundary the two polygons share.
pub fn shared_edge_length(a: &Polygon<f64>, b: &Polygon<f64>, eps: f64) -> f64 {
    segments(&a.exterior().0)
        .flat_map(|(a1, a2)| segments(&b.exterior().0)
            .map(move |(b1, b2)| collinear_overlap(a1, a2, b1, b2, eps)))
        .sum()
}

/// Number of vertices of `a` that coincide (within `eps`) with a vertex of `b`.
pub fn shared_vertex_count(a: &Polygon<f64>, b: &Polygon<f64>, eps: f64) -> usize {
    let vb = polygon_vertices(b);
    polygon_vertices(a).iter()
        .filter(|&&p| vb.iter().any(|&q| distance(p, q) <= eps))
        .count()
}

/// Check whether two polygons share an edge.
///
/// True when the collinear overlap of their edges reaches `min_shared`, or
/// when they share at least two vertices. The vertex count is a proxy and
/// reports polygons that only meet at two separate corners as adjacent.
pub fn polygons_adjacent(a: &Polygon<f64>, b: &Polygon<f64>, min_shared: f64, eps: f64) -> bool {
    shared_edge_length(a, b, eps) >= min_shared || shared_vertex_count(a, b, eps) >= 2
}

/// Check whether vertices touch any edge of the other polygon, a weaker
/// relation than adjacency used to explain rejected selections.
pub fn polygons_touch(a: &Polygon<f64>, b: &Polygon<f64>, eps: f64) -> bool {
    let touches = |p: &Polygon<f64>, q: &Polygon<f64>| polygon_vertices(p).iter()
        .any(|&v| segments(&q.exterior().0).any(|(s, e)| point_on_segment(v, s, e, eps)));
    touches(a, b) || touches(b, a)
}

/// Check if the polygons form a single connected group under adjacency.
pub fn polygons_contiguous(polygons: &[&Polygon<f64>], min_shared: f64, eps: f64) -> bool {
    if polygons.len() <= 1 { return true }

    let n = polygons.len();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if polygons_adjacent(polygons[i], polygons[j], min_shared, eps) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }

    // BFS from the first polygon.
    let mut seen = 1;
    let mut visited = vec![false; n];
    let mut queue = VecDeque::from([0]);
    visited[0] = true;
    while let Some(u) = queue.pop_front() {
        for &v in &adj[u] {
            if !visited[v] {
                seen += 1;
                visited[v] = true;
                queue.push_back(v);
            }
        }
    }

    seen == n
}
