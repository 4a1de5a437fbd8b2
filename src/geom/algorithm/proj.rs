use anyhow::{anyhow, Context, Result};
use geo::{BoundingRect, Coord, LineString, MapCoords, Polygon, Rect};
use proj4rs::{proj::Proj as Proj4, transform::transform};


/// PROJ.4 string for WGS84 lon/lat (EPSG:4326).
pub const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// PROJ.4 string for the British National Grid (EPSG:27700).
pub const BNG_PROJ4: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 \
    +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs +type=crs";

#[inline]
fn is_geographic(proj_string: &str) -> bool {
    proj_string.contains("+proj=longlat") || proj_string.contains("+proj=latlong")
}

/// One-way coordinate transform between two CRSs.
/// Geographic CRSs take and return degrees; radians are handled internally.
pub struct Reprojector {
    from: Proj4,
    to: Proj4,
    from_geographic: bool,
    to_geographic: bool,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("from_geographic", &self.from_geographic)
            .field("to_geographic", &self.to_geographic)
            .finish_non_exhaustive()
    }
}

impl Reprojector {
    /// Build a transform from two PROJ.4 strings.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: Proj4::from_proj_string(from)
                .with_context(|| anyhow!("failed to build source PROJ.4: {from}"))?,
            to: Proj4::from_proj_string(to)
                .with_context(|| anyhow!("failed to build target PROJ.4: {to}"))?,
            from_geographic: is_geographic(from),
            to_geographic: is_geographic(to),
        })
    }

    /// Transform a single coordinate.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = if self.from_geographic { (coord.x.to_radians(), coord.y.to_radians(), 0.0) }
            else { (coord.x, coord.y, 0.0) };

        transform(&self.from, &self.to, &mut point)
            .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;

        Ok(if self.to_geographic { Coord { x: point.0.to_degrees(), y: point.1.to_degrees() } }
            else { Coord { x: point.0, y: point.1 } })
    }

    /// Transform every coordinate of a geometry.
    pub fn geometry<G>(&self, geometry: &G) -> Result<G::Output>
    where G: MapCoords<f64, f64> {
        geometry.try_map_coords(|coord| self.coord(coord))
    }

    /// Transform a polygon's exterior ring.
    #[inline]
    pub fn polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        self.geometry(polygon)
    }

    /// Transform an extent by its four corners and take their bounds.
    pub fn extent(&self, extent: &Rect<f64>) -> Result<Rect<f64>> {
        let (min, max) = (extent.min(), extent.max());
        let corners = [
            min, Coord { x: max.x, y: min.y }, max, Coord { x: min.x, y: max.y },
        ].into_iter()
            .map(|c| self.coord(c))
            .collect::<Result<Vec<_>>>()?;
        LineString::from(corners).bounding_rect().ok_or_else(|| anyhow!("empty extent"))
    }
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    #[test]
    fn wgs84_to_bng_round_trips() {
        let forward = Reprojector::new(WGS84_PROJ4, BNG_PROJ4).unwrap();
        let inverse = Reprojector::new(BNG_PROJ4, WGS84_PROJ4).unwrap();

        let lonlat = coord! { x: -1.5, y: 52.5 };
        let bng = forward.coord(lonlat).unwrap();
        // Central England lands in the middle of the grid.
        assert!(bng.x > 400_000.0 && bng.x < 500_000.0);
        assert!(bng.y > 250_000.0 && bng.y < 350_000.0);

        let back = inverse.coord(bng).unwrap();
        assert!((back.x - lonlat.x).abs() < 1e-6);
        assert!((back.y - lonlat.y).abs() < 1e-6);
    }
}
