#![doc = "Parcelkit public API"]
mod config;
mod draw;
mod error;
mod fill;
mod geom;
mod index;
mod io;
mod slice;
mod snap;
mod types;
mod validate;

#[doc(inline)]
pub use config::{CrsConfig, DrawConfig, EngineConfig, IndexConfig, SnapConfig, ValidatorConfig};

#[doc(inline)]
pub use error::{EditError, Notice, Severity};

#[doc(inline)]
pub use types::{DrawMode, GeometryRef, Parcel};

#[doc(inline)]
pub use geom::{
    close_ring, closest_point_on_ring, convex_hull, dedup_vertices, distinct_vertex_count, extent_contains, extent_eq,
    is_structurally_valid, nearest_vertex, polygon_area, polygon_from_vertices, polygon_vertices,
    signed_area, AreaReadout, Coordinate, Extent, Reprojector, RingPoint, BNG_PROJ4, WGS84_PROJ4,
};

#[doc(inline)]
pub use index::{
    fetch_reference_features, parse_feature_collection, parse_geometry, FeatureGeometry, FeatureHit, FeaturePage,
    FeatureSource, LayerType, ReferenceFeature, ReferenceIndex, RefreshScheduler, RefreshStatus,
};

#[cfg(feature = "download")]
#[doc(inline)]
pub use index::HttpFeatureSource;

#[doc(inline)]
pub use snap::{Snap, SnapKind, SnapResolver, SnapScene, SnapSources, SnapTarget};

#[doc(inline)]
pub use validate::{
    correct_geometry_to_boundary, point_inside_or_on, point_on_polygon_boundary, point_on_segment,
    point_strictly_inside_polygon, polygon_within_boundary, polygons_adjacent, polygons_contiguous, polygons_overlap,
    polygons_touch, segments_properly_intersect, shared_edge_length, shared_vertex_count, snap_to_boundary,
    ValidationReport, Validator,
};

#[doc(inline)]
pub use draw::{
    preview, Activity, ClickOutcome, DrawingSession, PointerDown, PointerFeedback, Preview, SessionBuilder,
    StaticViewport, Viewport,
};

#[doc(inline)]
pub use fill::{merge_polygons, FillEvent, FillMode, FillTool};

#[doc(inline)]
pub use slice::{split_polygon, Chord, SliceStep, SliceTool};

#[doc(inline)]
pub use io::{
    boundary_to_geojson, crs_epsg, parcels_to_geojson, read_boundary, read_geojson_file, read_parcels,
    read_polygons, reference_features_to_geojson, to_geographic, write_geojson_file, FileStore, MemoryStore,
    ParcelStore,
};
