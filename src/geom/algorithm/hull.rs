use std::cmp::Ordering;

use geo::{Coord, Polygon};

use crate::geom::{close_ring, cross, distance};

/// Convex hull of a point set (Graham scan).
///
/// The scan anchors on the bottom-most point (leftmost on ties), sorts the
/// remaining points by polar angle around it (nearer first on ties), and keeps
/// a stack of left turns. Returns `None` when the points span no area.
pub fn convex_hull(points: &[Coord<f64>]) -> Option<Polygon<f64>> {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() < 3 { return None }

    let anchor_idx = points.iter().enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)?;
    let anchor = points.swap_remove(anchor_idx);
    points.retain(|&p| p != anchor);

    points.sort_by(|&a, &b| {
        let turn = cross(anchor, a, b);
        if turn > 0.0 { Ordering::Less }
        else if turn < 0.0 { Ordering::Greater }
        else { distance(anchor, a).total_cmp(&distance(anchor, b)) }
    });

    let mut stack: Vec<Coord<f64>> = vec![anchor];
    for p in points {
        while stack.len() >= 2 && cross(stack[stack.len() - 2], stack[stack.len() - 1], p) <= 0.0 {
            stack.pop();
        }
        stack.push(p);
    }

    if stack.len() < 3 { return None }
    Some(Polygon::new(close_ring(&stack), vec![]))
}
