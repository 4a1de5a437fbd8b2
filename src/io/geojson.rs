use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Polygon};
use serde_json::{json, Map, Value};

use crate::config::CrsConfig;
use crate::geom::{polygon_from_vertices, polygon_vertices, Reprojector};
use crate::index::{parse_coord, parse_polygon, FeatureGeometry, ReferenceFeature};
use crate::types::Parcel;

/// Property keys written by the exporter; everything else is attribute payload.
const COLOUR_KEY: &str = "colour_index";
const VALID_KEY: &str = "valid";

/// Named-CRS member for an EPSG code.
pub fn crs_member(epsg: u32) -> Value {
    json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") },
    })
}

/// EPSG code from a named-CRS member, if present.
pub fn crs_epsg(value: &Value) -> Option<u32> {
    value["crs"]["properties"]["name"].as_str()?
        .rsplit(':')
        .next()?
        .parse()
        .ok()
}

/// GeoJSON Polygon geometry with a closed exterior ring.
pub fn polygon_geometry(polygon: &Polygon<f64>) -> Value {
    let ring = polygon.exterior().coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>();
    json!({ "type": "Polygon", "coordinates": [ring] })
}

/// The boundary as a CRS-tagged Feature.
pub fn boundary_to_geojson(boundary: &Polygon<f64>, epsg: u32) -> Value {
    json!({
        "type": "Feature",
        "crs": crs_member(epsg),
        "geometry": polygon_geometry(boundary),
        "properties": {},
    })
}

/// The parcels as a CRS-tagged FeatureCollection.
pub fn parcels_to_geojson(parcels: &[Parcel], epsg: u32) -> Value {
    let features = parcels.iter()
        .map(|parcel| {
            let mut properties = parcel.attributes.clone();
            properties.insert(COLOUR_KEY.into(), json!(parcel.color));
            properties.insert(VALID_KEY.into(), json!(parcel.valid));
            json!({
                "type": "Feature",
                "geometry": polygon_geometry(&parcel.polygon),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "crs": crs_member(epsg),
        "features": features,
    })
}

/// Reference features as a CRS-tagged FeatureCollection with `layer` and `id` properties.
pub fn reference_features_to_geojson(features: &[ReferenceFeature], epsg: u32) -> Value {
    let features = features.iter()
        .map(|feature| {
            let geometry = match &feature.geometry {
                FeatureGeometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x, p.y] }),
                FeatureGeometry::Line(line) => json!({
                    "type": "LineString",
                    "coordinates": line.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>(),
                }),
                FeatureGeometry::Polygon(polygon) => polygon_geometry(polygon),
            };
            json!({
                "type": "Feature",
                "id": feature.id,
                "geometry": geometry,
                "properties": { "layer": feature.layer.to_string() },
            })
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "crs": crs_member(epsg),
        "features": features,
    })
}

/// Polygons of a GeoJSON geometry: a Polygon, or the first part of a MultiPolygon.
fn geometry_polygon(geometry: &Value) -> Result<Option<Polygon<f64>>> {
    let coords = &geometry["coordinates"];
    let polygon = match geometry["type"].as_str() {
        Some("Polygon") => parse_polygon(coords)?,
        Some("MultiPolygon") => match coords.as_array().and_then(|parts| parts.first()) {
            Some(first) => parse_polygon(first)?,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    // Holes are dropped; user geometry is single-ring.
    Ok(polygon_from_vertices(polygon_vertices(&polygon)))
}

/// `(geometry, properties)` pairs of a Polygon, MultiPolygon, Feature or FeatureCollection.
fn features(value: &Value) -> Result<Vec<(&Value, Option<&Map<String, Value>>)>> {
    Ok(match value["type"].as_str() {
        Some("FeatureCollection") => value["features"].as_array()
            .ok_or_else(|| anyhow!("FeatureCollection has no `features` array"))?
            .iter()
            .map(|f| (&f["geometry"], f["properties"].as_object()))
            .collect(),
        Some("Feature") => vec![(&value["geometry"], value["properties"].as_object())],
        Some("Polygon" | "MultiPolygon") => vec![(value, None)],
        Some(other) => bail!("unsupported GeoJSON type `{other}`"),
        None => bail!("GeoJSON object has no `type`"),
    })
}

/// Read every polygon in a GeoJSON document. Non-polygon features are skipped.
pub fn read_polygons(value: &Value) -> Result<Vec<Polygon<f64>>> {
    let mut polygons = Vec::new();
    for (geometry, _) in features(value)? {
        polygons.extend(geometry_polygon(geometry)?);
    }
    Ok(polygons)
}

/// Read a boundary: the first polygon in the document.
pub fn read_boundary(value: &Value) -> Result<Polygon<f64>> {
    read_polygons(value)?.into_iter().next()
        .ok_or_else(|| anyhow!("GeoJSON contains no polygon"))
}

/// Read parcels with their colour, validity flag and attribute payload.
pub fn read_parcels(value: &Value) -> Result<Vec<Parcel>> {
    let mut parcels = Vec::new();
    for (geometry, properties) in features(value)? {
        let Some(polygon) = geometry_polygon(geometry)? else { continue };

        let mut attributes = properties.cloned().unwrap_or_default();
        let color = attributes.remove(COLOUR_KEY).and_then(|v| v.as_u64()).unwrap_or(0);
        let valid = attributes.remove(VALID_KEY).and_then(|v| v.as_bool()).unwrap_or(true);

        let mut parcel = Parcel::new(polygon, u8::try_from(color).unwrap_or(0));
        parcel.attributes = attributes;
        parcel.valid = valid;
        parcels.push(parcel);
    }
    Ok(parcels)
}

/// Reproject every coordinate array in a geometry object in place.
fn reproject_coordinates(value: &mut Value, reprojector: &Reprojector) -> Result<()> {
    let Some(items) = value.as_array_mut() else { return Ok(()) };
    if items.first().is_some_and(Value::is_number) {
        let Coord { x, y } = reprojector.coord(parse_coord(value)?)?;
        *value = json!([x, y]);
        return Ok(())
    }
    for item in items { reproject_coordinates(item, reprojector)? }
    Ok(())
}

/// Convert an exported document from the working CRS to the geographic CRS.
pub fn to_geographic(value: &Value, crs: &CrsConfig) -> Result<Value> {
    let reprojector = Reprojector::new(&crs.working_proj4, &crs.service_proj4)?;
    let mut out = value.clone();

    let kind = out["type"].as_str().map(str::to_owned);
    let geometries: Vec<&mut Value> = match kind.as_deref() {
        Some("FeatureCollection") => out["features"].as_array_mut()
            .map(|fs| fs.iter_mut().map(|f| &mut f["geometry"]).collect())
            .unwrap_or_default(),
        Some("Feature") => vec![&mut out["geometry"]],
        _ => vec![&mut out],
    };
    for geometry in geometries {
        reproject_coordinates(&mut geometry["coordinates"], &reprojector)
            .context("failed to reproject GeoJSON coordinates")?;
    }

    if let Some(object) = out.as_object_mut() {
        object.insert("crs".into(), crs_member(crs.service_epsg));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::coord;

    use super::*;
    use crate::geom::WGS84_PROJ4;
    use crate::index::LayerType;

    fn square() -> Polygon<f64> {
        polygon_from_vertices(&[coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }, coord! { x: 0.0, y: 10.0 }]).unwrap()
    }

    #[test]
    fn boundary_export_is_closed_and_tagged() {
        let value = boundary_to_geojson(&square(), 27700);
        assert_eq!(value["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::27700");
        assert_eq!(crs_epsg(&value), Some(27700));

        let ring = value["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn parcel_properties_survive_import() {
        let mut parcel = Parcel::new(square(), 3);
        parcel.valid = false;
        parcel.attributes.insert("habitat".into(), json!("grassland"));

        let value = parcels_to_geojson(&[parcel.clone()], 27700);
        assert_eq!(value["features"][0]["properties"]["colour_index"], 3);
        assert_eq!(value["features"][0]["properties"]["habitat"], "grassland");

        let read = read_parcels(&value).unwrap();
        assert_eq!(read, vec![parcel]);
    }

    #[test]
    fn import_accepts_bare_and_multi_geometries() {
        let open: Value = serde_json::from_str(r#"{ "type": "Polygon", "coordinates": [[[0,0],[4,0],[4,4]]] }"#).unwrap();
        let boundary = read_boundary(&open).unwrap();
        assert_eq!(boundary.exterior().0.len(), 4);

        let multi: Value = serde_json::from_str(r#"{ "type": "Feature", "properties": null, "geometry": {
            "type": "MultiPolygon", "coordinates": [ [[[0,0],[1,0],[1,1],[0,0]]], [[[5,5],[6,5],[6,6],[5,5]]] ] } }"#).unwrap();
        assert_eq!(read_polygons(&multi).unwrap().len(), 1);

        let point: Value = serde_json::from_str(r#"{ "type": "Point", "coordinates": [0, 0] }"#).unwrap();
        assert!(read_polygons(&point).is_err());
    }

    #[test]
    fn reference_features_keep_layer_and_id() {
        let features = vec![
            ReferenceFeature::new(LayerType::Building, Some("b1".into()), FeatureGeometry::Polygon(square())),
            ReferenceFeature::new(LayerType::Rail, None, FeatureGeometry::Point(coord! { x: 1.0, y: 2.0 })),
        ];
        let value = reference_features_to_geojson(&features, 27700);
        assert_eq!(value["features"][0]["id"], "b1");
        assert_eq!(value["features"][0]["properties"]["layer"], "building");
        assert_eq!(value["features"][1]["geometry"]["type"], "Point");
        assert_eq!(read_polygons(&value).unwrap(), vec![square()]);
    }

    #[test]
    fn geographic_export_swaps_crs_tag() {
        let crs = CrsConfig { working_proj4: WGS84_PROJ4.into(), working_epsg: 4326, ..CrsConfig::default() };
        let value = to_geographic(&boundary_to_geojson(&square(), 4326), &crs).unwrap();
        assert_eq!(crs_epsg(&value), Some(crs.service_epsg));
        assert_relative_eq!(value["geometry"]["coordinates"][0][2][0].as_f64().unwrap(), 10.0, epsilon = 1e-9);
    }
}
