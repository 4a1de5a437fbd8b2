mod algorithm;
mod bbox;
mod ring;

pub use algorithm::{convex_hull, Reprojector, BNG_PROJ4, WGS84_PROJ4};
pub use bbox::{extent_contains, extent_eq, Extent};
pub(crate) use bbox::{search_envelope, Envelope};
pub use ring::*;

/// A planar coordinate in the working CRS (meters).
pub type Coordinate = geo::Coord<f64>;
