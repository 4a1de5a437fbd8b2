use geo::{Coord, LineString, Polygon};

use crate::geom::{close_ring, dedup_vertices, AreaReadout};

/// Geometry shown for the polygon being drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl Preview {
    /// Area of the previewed polygon; lines have none.
    pub fn area(&self) -> Option<AreaReadout> {
        match self {
            Preview::Line(_) => None,
            Preview::Polygon(polygon) => Some(AreaReadout::of_vertices(&polygon.exterior().0)),
        }
    }
}

/// Derive the preview from the committed vertices and the current pointer.
///
/// Fewer than two points give nothing, fewer than three a line, otherwise a
/// closed polygon.
pub fn preview(vertices: &[Coord<f64>], pointer: Option<Coord<f64>>) -> Option<Preview> {
    let mut points = vertices.to_vec();
    points.extend(pointer);
    let points = dedup_vertices(&points);

    match points.len() {
        0 | 1 => None,
        2 => Some(Preview::Line(LineString(points))),
        _ => Some(Preview::Polygon(Polygon::new(close_ring(&points), vec![]))),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::coord;

    use super::*;

    #[test]
    fn line_then_polygon() {
        let placed = [coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }];
        assert!(preview(&placed[..1], None).is_none());
        assert!(matches!(preview(&placed[..1], Some(coord! { x: 5.0, y: 5.0 })), Some(Preview::Line(_))));

        let Some(Preview::Polygon(polygon)) = preview(&placed, Some(coord! { x: 10.0, y: 10.0 })) else { panic!("expected polygon") };
        assert_eq!(polygon.exterior().0.len(), 4);
        assert_relative_eq!(Preview::Polygon(polygon).area().unwrap().square_meters, 50.0);
    }

    #[test]
    fn pointer_on_last_vertex_adds_nothing() {
        let placed = [coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }];
        assert!(matches!(preview(&placed, Some(coord! { x: 10.0, y: 0.0 })), Some(Preview::Line(_))));
    }
}
