mod sources;

pub use sources::SnapSources;

use geo::{Coord, Polygon};

use crate::config::SnapConfig;
use crate::geom::{closest_point_on_ring, nearest_vertex};
use crate::index::ReferenceIndex;
use crate::types::{GeometryRef, Parcel};
use crate::validate::point_inside_or_on;

/// What kind of geometry a resolved point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapKind {
    None,
    ReferenceFeature,
    BoundaryVertex,
    BoundaryEdge,
    ParcelVertex,
    ParcelEdge,
}

/// Where on a committed ring a snapped point lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapTarget {
    pub geometry: GeometryRef,
    /// Ring segment the point lies on (segment `i` starts at vertex `i`).
    pub segment: usize,
    /// Vertex index when the point is exactly a ring vertex.
    pub vertex: Option<usize>,
}

/// A resolved pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub coord: Coord<f64>,
    pub kind: SnapKind,
    pub target: Option<SnapTarget>,
}

impl Snap {
    /// The unsnapped pointer position.
    #[inline]
    pub fn none(coord: Coord<f64>) -> Self { Self { coord, kind: SnapKind::None, target: None } }

    #[inline] pub fn is_snapped(&self) -> bool { self.kind != SnapKind::None }

    fn vertex(geometry: GeometryRef, ring: &[Coord<f64>], i: usize) -> Self {
        let kind = if geometry == GeometryRef::Boundary { SnapKind::BoundaryVertex } else { SnapKind::ParcelVertex };
        Self { coord: ring[i], kind, target: Some(SnapTarget { geometry, segment: i, vertex: Some(i) }) }
    }

    fn edge(geometry: GeometryRef, coord: Coord<f64>, segment: usize) -> Self {
        let kind = if geometry == GeometryRef::Boundary { SnapKind::BoundaryEdge } else { SnapKind::ParcelEdge };
        Self { coord, kind, target: Some(SnapTarget { geometry, segment, vertex: None }) }
    }
}

/// Committed geometry the resolver snaps against.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapScene<'a> {
    pub boundary: Option<&'a Polygon<f64>>,
    pub parcels: &'a [Parcel],
    /// Geometry being drawn or edited; never a snap candidate.
    pub exclude: Option<GeometryRef>,
    pub index: Option<&'a ReferenceIndex>,
    /// Pull results outside the boundary back onto it (parcels mode).
    pub clamp_to_boundary: bool,
}

impl<'a> SnapScene<'a> {
    fn boundary_ring(&self) -> Option<&'a [Coord<f64>]> {
        if self.exclude == Some(GeometryRef::Boundary) { return None }
        self.boundary.map(|b| b.exterior().0.as_slice())
    }

    fn parcel_rings(&self) -> impl Iterator<Item = (GeometryRef, &'a [Coord<f64>])> + '_ {
        self.parcels.iter().enumerate()
            .map(|(i, p)| (GeometryRef::Parcel(i), p.polygon.exterior().0.as_slice()))
            .filter(move |(geometry, _)| self.exclude != Some(*geometry))
    }

    /// Closest exact vertex among the boundary and the parcels.
    fn nearest_committed_vertex(&self, p: Coord<f64>, tolerance: f64) -> Option<(Snap, f64)> {
        self.boundary_ring().map(|ring| (GeometryRef::Boundary, ring)).into_iter()
            .chain(self.parcel_rings())
            .filter_map(|(geometry, ring)| nearest_vertex(p, ring).map(|(i, d)| (Snap::vertex(geometry, ring, i), d)))
            .filter(|&(_, d)| d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Resolves pointer positions to snap points in strict priority order.
#[derive(Debug, Clone, Default)]
pub struct SnapResolver {
    config: SnapConfig,
}

impl SnapResolver {
    pub fn new(config: SnapConfig) -> Self { Self { config } }

    #[inline] pub fn config(&self) -> &SnapConfig { &self.config }

    /// Edge tolerance in map units at the given resolution (map units per pixel).
    #[inline] pub fn tolerance(&self, resolution: f64) -> f64 { self.config.tolerance_px * resolution }

    /// Vertex tolerance in map units at the given resolution.
    #[inline] pub fn vertex_tolerance(&self, resolution: f64) -> f64 { self.tolerance(resolution) * self.config.vertex_factor }

    /// Resolve `pointer` against the scene.
    ///
    /// Groups are tried in order: boundary vertices, other parcels' vertices,
    /// boundary edges, other parcels' edges, reference vertices, reference
    /// edges. The first group with a candidate inside its tolerance wins, even
    /// if a later group has a closer one. The result is then pulled onto any
    /// exact committed vertex within the sliver radius, and finally clamped to
    /// the boundary when the scene asks for it.
    pub fn resolve(&self, pointer: Coord<f64>, resolution: f64, sources: &SnapSources, scene: &SnapScene<'_>) -> Snap {
        let snap = self.resolve_candidates(pointer, resolution, sources, scene)
            .map(|snap| self.resnap_sliver(snap, resolution, scene))
            .unwrap_or_else(|| Snap::none(pointer));

        if scene.clamp_to_boundary { clamp_to_boundary(snap, scene, 1e-9) } else { snap }
    }

    fn resolve_candidates(&self, p: Coord<f64>, resolution: f64, sources: &SnapSources, scene: &SnapScene<'_>) -> Option<Snap> {
        let tol = self.tolerance(resolution);
        let vtol = self.vertex_tolerance(resolution);

        // 1. Boundary vertices.
        if sources.boundary_vertices {
            if let Some(ring) = scene.boundary_ring() {
                if let Some((i, d)) = nearest_vertex(p, ring) {
                    if d <= vtol { return Some(Snap::vertex(GeometryRef::Boundary, ring, i)) }
                }
            }
        }

        // 2. Vertices of the other parcels.
        if sources.parcel_vertices {
            let best = scene.parcel_rings()
                .filter_map(|(geometry, ring)| nearest_vertex(p, ring).map(|(i, d)| (geometry, ring, i, d)))
                .filter(|&(.., d)| d <= vtol)
                .min_by(|a, b| a.3.total_cmp(&b.3));
            if let Some((geometry, ring, i, _)) = best { return Some(Snap::vertex(geometry, ring, i)) }
        }

        // 3. Boundary edges.
        if sources.boundary_edges {
            if let Some(hit) = scene.boundary_ring().and_then(|ring| closest_point_on_ring(p, ring)) {
                if hit.distance <= tol { return Some(Snap::edge(GeometryRef::Boundary, hit.coord, hit.segment)) }
            }
        }

        // 4. Edges of the other parcels.
        if sources.parcel_edges {
            let best = scene.parcel_rings()
                .filter_map(|(geometry, ring)| closest_point_on_ring(p, ring).map(|hit| (geometry, hit)))
                .filter(|(_, hit)| hit.distance <= tol)
                .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance));
            if let Some((geometry, hit)) = best { return Some(Snap::edge(geometry, hit.coord, hit.segment)) }
        }

        // 5. Reference features: vertices, then edges.
        if sources.reference {
            if let Some(index) = scene.index {
                let hit = index.nearest_vertex(p, vtol)
                    .or_else(|| index.nearest_point_on_any_feature(p, tol));
                if let Some(hit) = hit {
                    return Some(Snap { coord: hit.coord, kind: SnapKind::ReferenceFeature, target: None })
                }
            }
        }

        None
    }

    /// Replace a snapped point by an exact committed vertex within the sliver radius.
    fn resnap_sliver(&self, snap: Snap, resolution: f64, scene: &SnapScene<'_>) -> Snap {
        let radius = self.config.sliver_px * resolution;
        match scene.nearest_committed_vertex(snap.coord, radius) {
            Some((vertex, _)) if vertex.coord != snap.coord => vertex,
            _ => snap,
        }
    }
}

/// Move a point outside the boundary onto the closest point of the boundary ring.
fn clamp_to_boundary(snap: Snap, scene: &SnapScene<'_>, eps: f64) -> Snap {
    let Some(boundary) = scene.boundary else { return snap };
    let ring = &boundary.exterior().0;
    if point_inside_or_on(snap.coord, ring, eps) { return snap }

    match closest_point_on_ring(snap.coord, ring) {
        Some(hit) => Snap::edge(GeometryRef::Boundary, hit.coord, hit.segment),
        None => snap,
    }
}
