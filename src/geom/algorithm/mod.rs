mod hull;
mod proj;

pub use hull::convex_hull;
pub use proj::{Reprojector, BNG_PROJ4, WGS84_PROJ4};
