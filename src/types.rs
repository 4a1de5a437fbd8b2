use std::fmt;

use geo::Polygon;
use serde_json::{Map, Value};

/// Drawing session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    /// One output polygon, no containment constraint.
    #[default]
    SingleBoundary,
    /// A boundary plus non-overlapping parcels inside it.
    Parcels,
}

/// Identity of a committed geometry within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryRef {
    Boundary,
    Parcel(usize),
}

impl fmt::Display for GeometryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryRef::Boundary => f.write_str("boundary"),
            GeometryRef::Parcel(i) => write!(f, "parcel {}", i + 1),
        }
    }
}

/// A committed sub-region of the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub polygon: Polygon<f64>,
    /// Index into the host's colour palette.
    pub color: u8,
    /// Opaque attribute payload owned by the host application.
    pub attributes: Map<String, Value>,
    /// Result of the last soft validation; invalid parcels block saving.
    pub valid: bool,
}

impl Parcel {
    pub fn new(polygon: Polygon<f64>, color: u8) -> Self {
        Self { polygon, color, attributes: Map::new(), valid: true }
    }
}
