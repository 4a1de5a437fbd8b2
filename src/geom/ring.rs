use geo::{Area, Coord, LineString, Polygon};

/// Square meters per acre.
const ACRE_M2: f64 = 4_046.856_422_4;

/// Euclidean distance between two coordinates.
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Midpoint of the segment `a`-`b`.
#[inline]
pub fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord { x: (a.x + b.x) * 0.5, y: (a.y + b.y) * 0.5 }
}

/// Cross product of `b - a` and `c - a` (twice the signed triangle area).
#[inline]
pub fn cross(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Closest point to `p` on the segment `a`-`b`.
pub fn closest_point_on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 { return a }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    Coord { x: a.x + t * dx, y: a.y + t * dy }
}

/// A point on a ring, with the index of the segment it lies on.
/// Segment `i` runs from ring point `i` to ring point `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPoint {
    pub coord: Coord<f64>,
    pub segment: usize,
    pub distance: f64,
}

/// Closest point to `p` on a closed ring given as its full coordinate list.
pub fn closest_point_on_ring(p: Coord<f64>, ring: &[Coord<f64>]) -> Option<RingPoint> {
    ring.windows(2).enumerate()
        .map(|(segment, w)| {
            let coord = closest_point_on_segment(p, w[0], w[1]);
            RingPoint { coord, segment, distance: distance(p, coord) }
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Index and distance of the ring vertex nearest to `p` (closing duplicate excluded).
pub fn nearest_vertex(p: Coord<f64>, ring: &[Coord<f64>]) -> Option<(usize, f64)> {
    open_slice(ring).iter().enumerate()
        .map(|(i, &v)| (i, distance(p, v)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// View of a ring's coordinates without the closing duplicate.
#[inline]
pub fn open_slice(ring: &[Coord<f64>]) -> &[Coord<f64>] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Open vertex list of a polygon's exterior ring.
#[inline]
pub fn polygon_vertices(polygon: &Polygon<f64>) -> &[Coord<f64>] {
    open_slice(&polygon.exterior().0)
}

/// Remove consecutive duplicates (including a duplicate at the wrap-around).
pub fn dedup_vertices(vertices: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(vertices.len());
    for &v in vertices {
        if out.last() != Some(&v) { out.push(v) }
    }
    while out.len() > 1 && out.first() == out.last() { out.pop(); }
    out
}

/// Number of distinct vertices in an open or closed vertex list.
pub fn distinct_vertex_count(vertices: &[Coord<f64>]) -> usize {
    let mut seen: Vec<Coord<f64>> = Vec::with_capacity(vertices.len());
    for &v in open_slice(vertices) {
        if !seen.contains(&v) { seen.push(v) }
    }
    seen.len()
}

/// Build a closed ring from an open vertex list.
pub fn close_ring(vertices: &[Coord<f64>]) -> LineString<f64> {
    let mut coords = vertices.to_vec();
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last { coords.push(first) }
    }
    LineString(coords)
}

/// Build a single-ring polygon from an open vertex list.
/// Returns `None` when fewer than 3 distinct vertices remain.
pub fn polygon_from_vertices(vertices: &[Coord<f64>]) -> Option<Polygon<f64>> {
    let vertices = dedup_vertices(vertices);
    if distinct_vertex_count(&vertices) < 3 { return None }
    Some(Polygon::new(close_ring(&vertices), vec![]))
}

/// Check that a polygon's exterior is closed with at least 3 distinct vertices.
pub fn is_structurally_valid(polygon: &Polygon<f64>) -> bool {
    let ring = &polygon.exterior().0;
    ring.len() >= 4 && ring.first() == ring.last() && distinct_vertex_count(ring) >= 3
}

/// Signed area of an open or closed vertex list (positive for CCW).
pub fn signed_area(vertices: &[Coord<f64>]) -> f64 {
    if open_slice(vertices).len() < 3 { return 0.0 }
    Polygon::new(close_ring(vertices), vec![]).signed_area()
}

/// Unsigned area of a polygon's exterior ring.
#[inline]
pub fn polygon_area(polygon: &Polygon<f64>) -> f64 {
    Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area()
}

/// Reorder an open vertex list counter-clockwise.
pub fn ensure_ccw(vertices: &mut [Coord<f64>]) {
    if signed_area(vertices) < 0.0 { vertices.reverse() }
}

/// Segments of a closed ring as coordinate pairs.
#[inline]
pub fn segments(ring: &[Coord<f64>]) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
    ring.windows(2).map(|w| (w[0], w[1]))
}

/// Area figures shown while a polygon is being drawn or edited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaReadout {
    pub square_meters: f64,
    pub hectares: f64,
    pub acres: f64,
}

impl AreaReadout {
    pub fn from_square_meters(square_meters: f64) -> Self {
        Self {
            square_meters,
            hectares: square_meters / 10_000.0,
            acres: square_meters / ACRE_M2,
        }
    }

    /// Readout for an open or closed vertex list.
    pub fn of_vertices(vertices: &[Coord<f64>]) -> Self {
        Self::from_square_meters(signed_area(vertices).abs())
    }
}
