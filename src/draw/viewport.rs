use geo::Coord;

use crate::geom::Extent;

/// The host map as seen by a drawing session.
pub trait Viewport {
    /// Visible extent in working-CRS units.
    fn extent(&self) -> Extent;

    /// Map units per screen pixel.
    fn resolution(&self) -> f64;

    /// Current zoom level.
    fn zoom(&self) -> f64;

    /// Convert a map coordinate to a screen pixel position.
    fn to_pixel(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Enable or suspend background panning.
    fn set_panning(&mut self, enabled: bool);

    /// Screen distance between two map coordinates, in pixels.
    fn pixel_distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        let (a, b) = (self.to_pixel(a), self.to_pixel(b));
        (a.x - b.x).hypot(a.y - b.y)
    }
}

/// A fixed north-up viewport, pixel origin at the top-left corner.
#[derive(Debug, Clone)]
pub struct StaticViewport {
    extent: Extent,
    resolution: f64,
    zoom: f64,
    panning: bool,
}

impl StaticViewport {
    pub fn new(extent: Extent, resolution: f64, zoom: f64) -> Self {
        Self { extent, resolution, zoom, panning: true }
    }

    #[inline] pub fn panning(&self) -> bool { self.panning }

    /// Move and rescale the view.
    pub fn set_view(&mut self, extent: Extent, resolution: f64, zoom: f64) {
        self.extent = extent;
        self.resolution = resolution;
        self.zoom = zoom;
    }
}

impl Viewport for StaticViewport {
    #[inline] fn extent(&self) -> Extent { self.extent }

    #[inline] fn resolution(&self) -> f64 { self.resolution }

    #[inline] fn zoom(&self) -> f64 { self.zoom }

    fn to_pixel(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x - self.extent.min().x) / self.resolution,
            y: (self.extent.max().y - coord.y) / self.resolution,
        }
    }

    #[inline] fn set_panning(&mut self, enabled: bool) { self.panning = enabled }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{coord, Rect};

    use super::*;

    #[test]
    fn pixel_space_is_zoom_dependent() {
        let mut view = StaticViewport::new(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 100.0 }), 0.5, 18.0);
        assert_eq!(view.to_pixel(coord! { x: 10.0, y: 90.0 }), coord! { x: 20.0, y: 20.0 });
        assert_relative_eq!(view.pixel_distance(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 4.0 }), 10.0);

        view.set_view(view.extent(), 2.0, 16.0);
        assert_relative_eq!(view.pixel_distance(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 4.0 }), 2.5);
    }
}
