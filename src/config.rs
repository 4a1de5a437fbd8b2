use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geom::{BNG_PROJ4, WGS84_PROJ4};

/// Snapping tolerances, in screen pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Edge snapping radius.
    pub tolerance_px: f64,
    /// Vertex radius as a multiple of `tolerance_px`.
    pub vertex_factor: f64,
    /// Radius within which a snapped point is pulled onto an exact vertex.
    pub sliver_px: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self { tolerance_px: 10.0, vertex_factor: 1.5, sliver_px: 2.0 }
    }
}

/// Drawing and editing interaction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Pixel radius around the first vertex that closes the ring.
    pub close_px: f64,
    /// Pixel radius for grabbing an existing vertex.
    pub vertex_hit_px: f64,
    /// Map-unit radius for offering an insertable point on an edge.
    pub ghost_tolerance: f64,
    /// Minimum chord length (map units) accepted by the slice tool.
    pub min_slice_length: f64,
    /// Number of colours parcels cycle through.
    pub palette_size: u8,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self { close_px: 12.0, vertex_hit_px: 8.0, ghost_tolerance: 5.0, min_slice_length: 1.0, palette_size: 8 }
    }
}

/// Geometry validation tolerances, in map units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Floating-point comparison epsilon.
    pub epsilon: f64,
    /// Radius used when pulling parcel vertices onto the boundary.
    pub correction_tolerance: f64,
    /// Shortest collinear overlap that counts as a shared edge.
    pub min_shared_edge: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { epsilon: 1e-3, correction_tolerance: 0.5, min_shared_edge: 0.1 }
    }
}

/// Reference feature fetching and indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base URL of the feature service (collections live below it).
    pub service_url: String,
    /// Optional API key appended to every request.
    pub api_key: Option<String>,
    /// Collection ids for buildings, roads, water and rail.
    pub collections: [String; 4],
    /// Features requested per page.
    pub page_size: usize,
    /// Hard cap on pages fetched per layer and refresh.
    pub max_pages: usize,
    /// Views coarser than this zoom level get no reference features.
    pub min_zoom: f64,
    /// Quiet period after the last viewport change before fetching.
    pub throttle_ms: u64,
    /// Simplification tolerance applied to fetched geometries (map units).
    pub simplify_tolerance: f64,
}

impl IndexConfig {
    #[inline] pub fn throttle(&self) -> Duration { Duration::from_millis(self.throttle_ms) }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            service_url: "https://api.os.uk/features/ngd/ofa/v1/collections".into(),
            api_key: None,
            collections: [
                "bld-fts-buildingpart-1".into(),
                "trn-fts-roadtrackorpath-3".into(),
                "wtr-fts-waterpoint-1".into(),
                "trn-fts-rail-1".into(),
            ],
            page_size: 100,
            max_pages: 10,
            min_zoom: 16.0,
            throttle_ms: 300,
            simplify_tolerance: 0.5,
        }
    }
}

/// Coordinate reference systems at the import/export boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrsConfig {
    /// EPSG code of the planar working CRS.
    pub working_epsg: u32,
    pub working_proj4: String,
    /// EPSG code of the feature service CRS.
    pub service_epsg: u32,
    pub service_proj4: String,
}

impl Default for CrsConfig {
    fn default() -> Self {
        Self {
            working_epsg: 27700,
            working_proj4: BNG_PROJ4.into(),
            service_epsg: 4326,
            service_proj4: WGS84_PROJ4.into(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub draw: DrawConfig,
    pub validate: ValidatorConfig,
    pub index: IndexConfig,
    pub crs: CrsConfig,
}

impl EngineConfig {
    /// Read a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
