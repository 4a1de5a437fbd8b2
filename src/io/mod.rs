//! GeoJSON import/export and persistence hooks.
//!
//! - `geojson` converts committed geometry to and from CRS-tagged GeoJSON
//! - `store` defines the `ParcelStore` hooks the save gate hands documents to

mod geojson;
mod store;

pub use geojson::*;
pub use store::*;
