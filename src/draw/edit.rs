use geo::{Coord, Polygon};

use crate::geom::{close_ring, closest_point_on_ring, polygon_from_vertices, polygon_vertices, AreaReadout, RingPoint};
use crate::types::GeometryRef;
use super::Viewport;

/// Working copy of the geometry in edit focus.
///
/// Vertices are kept open; the closing coordinate is rebuilt from the first
/// vertex on every write-back, so moving or inserting next to the seam keeps
/// the ring closed.
#[derive(Debug, Clone)]
pub(crate) struct EditFocus {
    pub(crate) target: GeometryRef,
    pub(crate) vertices: Vec<Coord<f64>>,
    pub(crate) drag: Option<usize>,
    pub(crate) dirty: bool,
}

impl EditFocus {
    pub(crate) fn new(target: GeometryRef, polygon: &Polygon<f64>) -> Self {
        Self { target, vertices: polygon_vertices(polygon).to_vec(), drag: None, dirty: false }
    }

    /// Vertex under the pointer, hit-tested in screen pixels.
    pub(crate) fn hit_vertex(&self, viewport: &dyn Viewport, pointer: Coord<f64>, radius_px: f64) -> Option<usize> {
        self.vertices.iter().enumerate()
            .map(|(i, &v)| (i, viewport.pixel_distance(pointer, v)))
            .filter(|&(_, d)| d <= radius_px)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Insertable point on the nearest edge, within `tolerance` map units.
    pub(crate) fn ghost(&self, pointer: Coord<f64>, tolerance: f64) -> Option<RingPoint> {
        closest_point_on_ring(pointer, &close_ring(&self.vertices).0)
            .filter(|hit| hit.distance <= tolerance)
    }

    /// Insert a vertex after the start of the ghost's segment; returns its index.
    pub(crate) fn insert(&mut self, ghost: &RingPoint) -> usize {
        let at = (ghost.segment + 1).min(self.vertices.len());
        self.vertices.insert(at, ghost.coord);
        self.dirty = true;
        at
    }

    /// Vertex sitting exactly at `coord`.
    #[inline]
    pub(crate) fn vertex_at(&self, coord: Coord<f64>) -> Option<usize> {
        self.vertices.iter().position(|&v| v == coord)
    }

    /// Move vertex `i`. Moves that stack it on another vertex or collapse the
    /// ring are refused and leave the working copy untouched.
    pub(crate) fn move_vertex(&mut self, i: usize, coord: Coord<f64>) -> bool {
        if i >= self.vertices.len() { return false }
        if self.vertex_at(coord).is_some_and(|j| j != i) { return false }

        let previous = std::mem::replace(&mut self.vertices[i], coord);
        if polygon_from_vertices(&self.vertices).is_none() {
            self.vertices[i] = previous;
            return false
        }
        self.dirty = true;
        true
    }

    /// Discard the working copy in favour of `polygon`.
    pub(crate) fn reset(&mut self, polygon: &Polygon<f64>) {
        self.vertices = polygon_vertices(polygon).to_vec();
        self.dirty = false;
    }

    /// Closed polygon for the current working copy, if it is still a polygon.
    #[inline]
    pub(crate) fn polygon(&self) -> Option<Polygon<f64>> { polygon_from_vertices(&self.vertices) }

    #[inline]
    pub(crate) fn area(&self) -> AreaReadout { AreaReadout::of_vertices(&self.vertices) }
}
