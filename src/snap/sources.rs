use serde::{Deserialize, Serialize};

/// Independent switches for each snap candidate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSources {
    pub reference: bool,
    pub boundary_vertices: bool,
    pub boundary_edges: bool,
    pub parcel_vertices: bool,
    pub parcel_edges: bool,
}

impl Default for SnapSources {
    fn default() -> Self { Self::all() }
}

impl SnapSources {
    pub const fn all() -> Self {
        Self { reference: true, boundary_vertices: true, boundary_edges: true, parcel_vertices: true, parcel_edges: true }
    }

    pub const fn none() -> Self {
        Self { reference: false, boundary_vertices: false, boundary_edges: false, parcel_vertices: false, parcel_edges: false }
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.reference || self.boundary_vertices || self.boundary_edges || self.parcel_vertices || self.parcel_edges
    }
}
