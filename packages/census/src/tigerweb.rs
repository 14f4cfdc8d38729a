//! ZCTA boundary lookup against the Census Bureau `TIGERweb` REST API.
//!
//! Queries the ZCTA layer of the `PUMA_TAD_TAZ_UGA_ZCTA` `MapServer` with
//! `f=geojson` and converts the first returned feature into a
//! [`Boundary`]. `GeoJSON` positions are `[lng, lat]`; boundaries are
//! `lat/lng`, so every position is swapped on the way through.

use geojson::GeoJson;
use zip_map_census_models::{Boundary, LatLng, Ring, ZipCode};

use crate::CensusError;

/// Fetches the boundary polygon for a ZIP code tabulation area.
///
/// `base_url` is the layer URL (ending in `/MapServer/<layer>`); the
/// `/query` endpoint is appended. When several features come back only
/// the first is used.
///
/// # Errors
///
/// * [`CensusError::Status`] on a non-success HTTP status
/// * [`CensusError::NotFound`] if the layer has no feature for `zip`
/// * [`CensusError::Conversion`] on an `ArcGIS` error envelope or a
///   feature whose geometry isn't a `Polygon`/`MultiPolygon`
pub async fn fetch_boundary(
    client: &reqwest::Client,
    base_url: &str,
    zip: &ZipCode,
) -> Result<Boundary, CensusError> {
    let url = format!("{base_url}/query");
    let filter = format!("ZCTA5='{zip}'");

    log::debug!("Fetching TIGERweb boundary for ZCTA {zip}");

    let resp = client
        .get(&url)
        .query(&[
            ("where", filter.as_str()),
            ("outFields", "*"),
            ("f", "geojson"),
        ])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        log::warn!("TIGERweb boundary request for {zip} failed with {status}");
        return Err(CensusError::Status {
            service: "Census TIGERweb",
            status,
        });
    }

    let json: serde_json::Value = resp.json().await?;
    let boundary = parse_boundary_response(json, zip)?;

    log::info!(
        "Loaded boundary for {zip}: {} ring(s), {} point(s)",
        boundary.rings().len(),
        boundary.points().count()
    );

    Ok(boundary)
}

/// Converts a `TIGERweb` `GeoJSON` response body into a [`Boundary`].
fn parse_boundary_response(json: serde_json::Value, zip: &ZipCode) -> Result<Boundary, CensusError> {
    // ArcGIS reports query errors as a 200 with {"error": {"code", "message"}}
    if let Some(error_obj) = json.get("error") {
        let code = error_obj
            .get("code")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        let msg = error_obj
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        return Err(CensusError::Conversion {
            message: format!("ArcGIS error {code}: {msg}"),
        });
    }

    let geojson = GeoJson::from_json_value(json).map_err(|e| CensusError::Conversion {
        message: format!("Invalid GeoJSON from TIGERweb: {e}"),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(CensusError::Conversion {
            message: "TIGERweb response is not a FeatureCollection".to_string(),
        });
    };

    let Some(feature) = collection.features.into_iter().next() else {
        return Err(CensusError::NotFound {
            what: "boundary",
            zip: zip.to_string(),
        });
    };

    let geometry = feature.geometry.ok_or_else(|| CensusError::Conversion {
        message: format!("Boundary feature for {zip} has no geometry"),
    })?;

    rings_from_geometry(&geometry.value)
        .map(Boundary::new)
        .ok_or_else(|| CensusError::Conversion {
            message: format!(
                "Unsupported boundary geometry type for {zip}: {}",
                geometry_type(&geometry.value)
            ),
        })
}

/// Flattens a `Polygon` or `MultiPolygon` into lat/lng rings.
///
/// Returns `None` for any other geometry type.
fn rings_from_geometry(value: &geojson::Value) -> Option<Vec<Ring>> {
    match value {
        geojson::Value::Polygon(rings) => Some(rings.iter().map(|r| convert_ring(r)).collect()),
        geojson::Value::MultiPolygon(polygons) => Some(
            polygons
                .iter()
                .flat_map(|rings| rings.iter().map(|r| convert_ring(r)))
                .collect(),
        ),
        _ => None,
    }
}

const fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Swaps each `[lng, lat]` position into a [`LatLng`], skipping
/// positions without both ordinates.
fn convert_ring(ring: &[Vec<f64>]) -> Ring {
    ring.iter()
        .filter_map(|position| match position.as_slice() {
            [lng, lat, ..] => Some(LatLng::new(*lat, *lng)),
            _ => None,
        })
        .collect()
}
