use anyhow::{anyhow, Context, Result};
use geo::{Coord, LineString, Polygon, Rect};
use serde_json::Value;

use super::feature::{FeatureGeometry, LayerType, ReferenceFeature};

/// One page of features as returned by the service, in the service CRS.
#[derive(Debug, Clone, Default)]
pub struct FeaturePage {
    pub features: Vec<ReferenceFeature>,
    /// Number of service features on the page, before multi-part explosion.
    pub returned: usize,
}

/// Abstraction over the remote reference feature service.
pub trait FeatureSource: Send + Sync {
    /// Fetch one page of `layer` features intersecting `bbox` (service CRS).
    fn fetch_page(&self, layer: LayerType, bbox: &Rect<f64>, offset: usize, limit: usize) -> Result<FeaturePage>;
}

/// Parse a GeoJSON FeatureCollection into reference features of one layer.
/// Multi-part geometries are exploded; unsupported geometries are skipped.
pub fn parse_feature_collection(bytes: &[u8], layer: LayerType) -> Result<FeaturePage> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("GeoJSON response has no `features` array"))?;

    let mut page = FeaturePage { features: Vec::new(), returned: features.len() };
    for feature in features {
        let id = match &feature["id"] {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => feature["properties"]["osid"].as_str().map(str::to_string),
        };
        for geometry in parse_geometry(&feature["geometry"])? {
            page.features.push(ReferenceFeature::new(layer, id.clone(), geometry));
        }
    }
    Ok(page)
}

/// Parse a GeoJSON geometry object into single-part geometries.
pub fn parse_geometry(geometry: &Value) -> Result<Vec<FeatureGeometry>> {
    let coords = &geometry["coordinates"];
    Ok(match geometry["type"].as_str() {
        Some("Point") => vec![FeatureGeometry::Point(parse_coord(coords)?)],
        Some("MultiPoint") => array(coords)?.iter()
            .map(|c| parse_coord(c).map(FeatureGeometry::Point))
            .collect::<Result<_>>()?,
        Some("LineString") => vec![FeatureGeometry::Line(parse_path(coords)?)],
        Some("MultiLineString") => array(coords)?.iter()
            .map(|c| parse_path(c).map(FeatureGeometry::Line))
            .collect::<Result<_>>()?,
        Some("Polygon") => vec![FeatureGeometry::Polygon(parse_polygon(coords)?)],
        Some("MultiPolygon") => array(coords)?.iter()
            .map(|c| parse_polygon(c).map(FeatureGeometry::Polygon))
            .collect::<Result<_>>()?,
        _ => Vec::new(),
    })
}

#[inline]
fn array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("Invalid GeoJSON: expected an array of coordinates"))
}

/// Parse a `[x, y]` position.
pub(crate) fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = array(value)?;
    let x = pair.first().and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
    let y = pair.get(1).and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

/// Parse a list of positions.
pub(crate) fn parse_path(value: &Value) -> Result<LineString<f64>> {
    Ok(LineString(array(value)?.iter().map(parse_coord).collect::<Result<_>>()?))
}

/// Parse polygon rings; the first is the exterior. Rings are closed on read.
pub(crate) fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(parse_path).collect::<Result<Vec<_>>>()?;
    if rings.is_empty() { return Err(anyhow!("Invalid Polygon: missing exterior ring")) }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

#[cfg(feature = "download")]
pub use http::HttpFeatureSource;

#[cfg(feature = "download")]
mod http {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use geo::Rect;
    use reqwest::blocking::{Client, RequestBuilder};

    use super::{parse_feature_collection, FeaturePage, FeatureSource};
    use crate::{config::IndexConfig, index::LayerType};

    /// OGC API Features client over blocking HTTP.
    #[derive(Debug, Clone)]
    pub struct HttpFeatureSource {
        client: Client,
        base_url: String,
        api_key: Option<String>,
        collections: [String; 4],
    }

    impl HttpFeatureSource {
        pub fn new(config: &IndexConfig) -> Result<Self> {
            let client = Client::builder()
                .user_agent("parcelkit/0.1")
                .timeout(Duration::from_secs(20))
                .build()
                .context("failed to build HTTP client")?;

            Ok(Self {
                client,
                base_url: config.service_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                collections: config.collections.clone(),
            })
        }

        /// Items request for one page of a layer; parameters are URL-encoded.
        fn request(&self, layer: LayerType, bbox: &Rect<f64>, offset: usize, limit: usize) -> RequestBuilder {
            let (min, max) = (bbox.min(), bbox.max());
            let url = format!("{}/{}/items", self.base_url, self.collections[layer.ordinal()]);
            let request = self.client.get(url).query(&[
                ("bbox", format!("{},{},{},{}", min.x, min.y, max.x, max.y)),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]);
            match &self.api_key {
                Some(key) => request.query(&[("key", key)]),
                None => request,
            }
        }
    }

    impl FeatureSource for HttpFeatureSource {
        fn fetch_page(&self, layer: LayerType, bbox: &Rect<f64>, offset: usize, limit: usize) -> Result<FeaturePage> {
            let bytes = self.request(layer, bbox, offset, limit).send()
                .with_context(|| format!("GET {layer} features"))?
                .error_for_status()
                .with_context(|| format!("GET {layer} features returned error status"))?
                .bytes()
                .with_context(|| format!("read {layer} response body"))?;

            parse_feature_collection(&bytes, layer)
        }
    }

}
