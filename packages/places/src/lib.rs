#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Points of interest inside a ZIP code boundary.
//!
//! The Google Places "Text Search (New)" endpoint only accepts a rectangle
//! as a location restriction, so the search runs in two phases:
//!
//! 1. [`PlacesClient::search_candidates`] sends one request restricted to
//!    the boundary's bounding rectangle.
//! 2. [`PlacesClient::search_within`] drops candidates that fall outside
//!    the actual polygon, when a [`PointInPolygonTester`] is available.
//!
//! Without a tester the candidates are returned unfiltered and the outcome
//! is tagged [`PrecisionMode::BoundingBoxOnly`] so callers can say so.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip_map_census_models::{Boundary, LatLng, ZipCode};
use zip_map_spatial::{BoundingRect, PointInPolygonTester, PrecisionMode};

/// Fields requested from the Places API.
pub const FIELD_MASK: &str =
    "places.id,places.displayName,places.formattedAddress,places.rating,places.location";

/// Upper bound on results per search.
pub const MAX_RESULT_COUNT: u32 = 10;

/// Errors from the Places API.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("Places API request failed with status {}: {message}", status.as_u16())]
    Status {
        /// The HTTP status returned.
        status: reqwest::StatusCode,
        /// The service's error message, or "Unknown error".
        message: String,
    },
}

/// Localized display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    /// The text itself.
    pub text: String,
    /// BCP-47 language code, when provided.
    #[serde(default)]
    pub language_code: Option<String>,
}

/// A point's position as reported by the Places API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<PlaceLocation> for LatLng {
    fn from(location: PlaceLocation) -> Self {
        Self::new(location.latitude, location.longitude)
    }
}

impl From<LatLng> for PlaceLocation {
    fn from(point: LatLng) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lng,
        }
    }
}

/// A point of interest returned by a places search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Places API resource ID.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: Option<LocalizedText>,
    /// Full postal address.
    #[serde(default)]
    pub formatted_address: String,
    /// Average user rating (1.0 to 5.0).
    #[serde(default)]
    pub rating: Option<f64>,
    /// Where the place is.
    pub location: PlaceLocation,
}

impl Place {
    /// The display name, or an empty string when the API omitted it.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_ref().map_or("", |n| n.text.as_str())
    }

    /// The place's position as a [`LatLng`].
    #[must_use]
    pub fn position(&self) -> LatLng {
        self.location.into()
    }
}

/// Result of a boundary-scoped places search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesOutcome {
    /// Places in result order.
    pub places: Vec<Place>,
    /// How strictly `places` was filtered against the boundary.
    pub precision: PrecisionMode,
}

impl PlacesOutcome {
    /// An outcome with no places.
    #[must_use]
    pub const fn empty(precision: PrecisionMode) -> Self {
        Self {
            places: Vec::new(),
            precision,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest {
    text_query: String,
    location_restriction: LocationRestriction,
    max_result_count: u32,
}

#[derive(Serialize)]
struct LocationRestriction {
    rectangle: Rectangle,
}

#[derive(Serialize)]
struct Rectangle {
    low: PlaceLocation,
    high: PlaceLocation,
}

#[derive(Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Google Places text search client.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    /// Creates a places client.
    ///
    /// `base_url` is the full `places:searchText` endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Searches for popular places inside `boundary`'s bounding rectangle.
    ///
    /// An empty boundary yields no candidates and sends no request.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the HTTP request fails, the service answers
    /// with a non-success status, or the response can't be parsed.
    pub async fn search_candidates(
        &self,
        boundary: &Boundary,
        zip: &ZipCode,
    ) -> Result<Vec<Place>, PlacesError> {
        if boundary.is_empty() {
            return Ok(Vec::new());
        }
        let Some(rect) = BoundingRect::of(boundary) else {
            return Ok(Vec::new());
        };

        let request = SearchTextRequest {
            text_query: format!("popular places in {zip}"),
            location_restriction: LocationRestriction {
                rectangle: Rectangle {
                    low: rect.low.into(),
                    high: rect.high.into(),
                },
            },
            max_result_count: MAX_RESULT_COUNT,
        };

        log::debug!("Searching places for {zip} in {rect:?}");

        let resp = self
            .client
            .post(&self.base_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            log::warn!("Places search for {zip} failed with {status}: {message}");
            return Err(PlacesError::Status { status, message });
        }

        let response: SearchTextResponse = if body.trim().is_empty() {
            SearchTextResponse { places: Vec::new() }
        } else {
            serde_json::from_str(&body)?
        };

        log::info!("Places search for {zip} returned {} candidate(s)", response.places.len());

        Ok(response.places)
    }

    /// Searches for places and keeps only those inside `boundary`.
    ///
    /// With a `tester` every candidate is checked against the real polygon
    /// and the outcome is [`PrecisionMode::Exact`]. Without one, candidates
    /// inside the bounding rectangle but outside the polygon are kept and the
    /// outcome is [`PrecisionMode::BoundingBoxOnly`].
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::search_candidates`].
    pub async fn search_within(
        &self,
        boundary: &Boundary,
        zip: &ZipCode,
        tester: Option<&dyn PointInPolygonTester>,
    ) -> Result<PlacesOutcome, PlacesError> {
        let candidates = self.search_candidates(boundary, zip).await?;
        Ok(filter_to_boundary(candidates, boundary, tester))
    }
}

/// Applies the second, polygon-accurate filtering phase.
#[must_use]
pub fn filter_to_boundary(
    candidates: Vec<Place>,
    boundary: &Boundary,
    tester: Option<&dyn PointInPolygonTester>,
) -> PlacesOutcome {
    let Some(tester) = tester else {
        if !candidates.is_empty() {
            log::warn!(
                "No point-in-polygon tester available; returning {} place(s) filtered by bounding box only",
                candidates.len()
            );
        }
        return PlacesOutcome {
            places: candidates,
            precision: PrecisionMode::BoundingBoxOnly,
        };
    };

    let total = candidates.len();
    let places: Vec<Place> = candidates
        .into_iter()
        .filter(|p| tester.contains(boundary, p.position()))
        .collect();

    if places.len() < total {
        log::debug!("Dropped {} place(s) outside the boundary", total - places.len());
    }

    PlacesOutcome {
        places,
        precision: PrecisionMode::Exact,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip_map_spatial::GeoPolygonTester;

    use super::*;

    fn zip() -> ZipCode {
        ZipCode::parse("60602").unwrap()
    }

    fn client(server: &MockServer) -> PlacesClient {
        PlacesClient::new(
            reqwest::Client::new(),
            format!("{}/v1/places:searchText", server.uri()),
            "test-key".to_string(),
        )
    }

    /// An L-shape; the point (1.5, 1.5) is in its bounding box but not in it.
    fn l_shape() -> Boundary {
        Boundary::new(vec![vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(1.0, 2.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(2.0, 1.0),
            LatLng::new(2.0, 0.0),
            LatLng::new(0.0, 0.0),
        ]])
    }

    fn place_json(id: &str, lat: f64, lng: f64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "displayName": { "text": format!("Place {id}"), "languageCode": "en" },
            "formattedAddress": "1 Main St",
            "rating": 4.5,
            "location": { "latitude": lat, "longitude": lng }
        })
    }

    #[tokio::test]
    async fn empty_boundary_sends_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.search_candidates(&Boundary::default(), &zip()).await.unwrap().is_empty());
        assert!(
            client
                .search_candidates(&Boundary::new(vec![vec![]]), &zip())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn search_sends_bounding_rectangle_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/places:searchText"))
            .and(header("X-Goog-Api-Key", "test-key"))
            .and(headers("X-Goog-FieldMask", FIELD_MASK.split(',').collect()))
            .and(body_json(serde_json::json!({
                "textQuery": "popular places in 60602",
                "locationRestriction": {
                    "rectangle": {
                        "low": { "latitude": 0.0, "longitude": 0.0 },
                        "high": { "latitude": 2.0, "longitude": 2.0 }
                    }
                },
                "maxResultCount": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "places": [place_json("a", 0.5, 0.5)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let places = client(&server).search_candidates(&l_shape(), &zip()).await.unwrap();

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name(), "Place a");
        assert_eq!(places[0].rating, Some(4.5));
    }

    #[tokio::test]
    async fn missing_places_field_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let places = client(&server).search_candidates(&l_shape(), &zip()).await.unwrap();
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn error_status_surfaces_service_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).search_candidates(&l_shape(), &zip()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Places API request failed with status 403: API key not valid."
        );
    }

    #[tokio::test]
    async fn error_status_without_message_is_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = client(&server).search_candidates(&l_shape(), &zip()).await.unwrap_err();
        assert!(matches!(err, PlacesError::Status { ref message, .. } if message == "Unknown error"));
    }

    #[tokio::test]
    async fn exact_mode_drops_points_outside_polygon() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "places": [place_json("inside", 0.5, 0.5), place_json("corner", 1.5, 1.5)]
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .search_within(&l_shape(), &zip(), Some(&GeoPolygonTester))
            .await
            .unwrap();

        assert_eq!(outcome.precision, PrecisionMode::Exact);
        assert_eq!(outcome.places.len(), 1);
        assert_eq!(outcome.places[0].id, "inside");
    }

    #[tokio::test]
    async fn bounding_box_mode_keeps_all_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "places": [place_json("inside", 0.5, 0.5), place_json("corner", 1.5, 1.5)]
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).search_within(&l_shape(), &zip(), None).await.unwrap();

        assert_eq!(outcome.precision, PrecisionMode::BoundingBoxOnly);
        assert_eq!(outcome.places.len(), 2);
    }
}
