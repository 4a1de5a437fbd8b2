use anyhow::{Context, Result};
use geo::{Rect, Simplify};
use log::{debug, warn};
use rayon::prelude::*;

use crate::config::{CrsConfig, IndexConfig};
use crate::geom::{distinct_vertex_count, Reprojector};
use super::{FeatureGeometry, FeatureSource, LayerType, ReferenceFeature};

/// Page through one layer, stopping at a short page or the page cap.
fn fetch_layer(source: &dyn FeatureSource, layer: LayerType, bbox: &Rect<f64>, config: &IndexConfig) -> Result<Vec<ReferenceFeature>> {
    let mut features = Vec::new();
    for page_num in 0..config.max_pages {
        let page = source.fetch_page(layer, bbox, page_num * config.page_size, config.page_size)?;
        features.extend(page.features);
        if page.returned < config.page_size { break }
        if page_num + 1 == config.max_pages {
            debug!("[index] {layer}: page cap ({}) reached", config.max_pages);
        }
    }
    Ok(features)
}

/// Reproject a service-CRS feature into the working CRS and simplify it.
/// Returns `None` for geometries that collapse under simplification.
fn ingest(feature: ReferenceFeature, to_working: &Reprojector, tolerance: f64) -> Result<Option<ReferenceFeature>> {
    let geometry = match &feature.geometry {
        FeatureGeometry::Point(p) => FeatureGeometry::Point(to_working.coord(*p)?),
        FeatureGeometry::Line(line) => {
            let line = to_working.geometry(line)?.simplify(&tolerance);
            if line.0.len() < 2 { return Ok(None) }
            FeatureGeometry::Line(line)
        }
        FeatureGeometry::Polygon(polygon) => {
            let polygon = to_working.geometry(polygon)?.simplify(&tolerance);
            if distinct_vertex_count(&polygon.exterior().0) < 3 { return Ok(None) }
            FeatureGeometry::Polygon(polygon)
        }
    };
    Ok(Some(ReferenceFeature { geometry, ..feature }))
}

/// Fetch every layer intersecting `extent` (working CRS) in parallel.
///
/// Layers are settled independently: a failing layer is logged and
/// contributes no features. Errors are returned only when the CRS setup
/// itself fails.
pub fn fetch_reference_features(source: &dyn FeatureSource, extent: &Rect<f64>, config: &IndexConfig, crs: &CrsConfig) -> Result<Vec<ReferenceFeature>> {
    let bbox = Reprojector::new(&crs.working_proj4, &crs.service_proj4)?
        .extent(extent)
        .context("failed to convert viewport extent to service CRS")?;

    let settled = LayerType::ALL.par_iter()
        .map(|&layer| {
            let to_working = Reprojector::new(&crs.service_proj4, &crs.working_proj4)?;
            fetch_layer(source, layer, &bbox, config)?.into_iter()
                .map(|feature| ingest(feature, &to_working, config.simplify_tolerance))
                .filter_map(Result::transpose)
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Vec<Result<Vec<_>>>>();

    let mut features = Vec::new();
    for (layer, result) in LayerType::ALL.iter().zip(settled) {
        match result {
            Ok(layer_features) => {
                debug!("[index] {layer}: {} features", layer_features.len());
                features.extend(layer_features);
            }
            Err(e) => warn!("[index] {layer} fetch failed, skipping layer: {e:#}"),
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use geo::{coord, LineString};

    use super::*;
    use crate::geom::{BNG_PROJ4, WGS84_PROJ4};

    #[test]
    fn ingested_lines_are_projected_and_simplified() {
        let to_working = Reprojector::new(WGS84_PROJ4, BNG_PROJ4).unwrap();
        // The middle vertex sits centimetres off the chord.
        let road = LineString(vec![
            coord! { x: -1.0, y: 52.0 }, coord! { x: -0.99, y: 52.000_000_1 }, coord! { x: -0.98, y: 52.0 },
        ]);
        let feature = ReferenceFeature::new(LayerType::Road, None, FeatureGeometry::Line(road));

        let ingested = ingest(feature, &to_working, 1.0).unwrap().unwrap();
        let FeatureGeometry::Line(line) = ingested.geometry else { panic!("expected a line") };
        assert_eq!(line.0.len(), 2);
        // Working CRS is metric: 0.02 degrees of longitude at 52N is about 1.37 km.
        let length = (line.0[1].x - line.0[0].x).hypot(line.0[1].y - line.0[0].y);
        assert!((1_300.0..1_450.0).contains(&length), "length {length}");
    }
}
