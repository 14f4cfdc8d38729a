//! Google Geocoding API client.
//!
//! - Reverse: `GET {base_url}?latlng={lat},{lng}&key={key}`
//! - Forward: `GET {base_url}?address={zip}&key={key}`
//!
//! The API answers `200 OK` even when nothing matched; the JSON `status`
//! field (`"OK"`, `"ZERO_RESULTS"`, `"REQUEST_DENIED"`, ...) says what
//! actually happened. Anything other than `"OK"` is treated as no result.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use serde::Deserialize;
use zip_map_census_models::{LatLng, ZipCode};

use crate::GeocodeError;
use crate::location::{LocationProvider, resolve_position};

/// Google Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

impl GoogleGeocoder {
    /// Creates a geocoder client.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Resolves a coordinate pair to a ZIP code.
    ///
    /// When `coordinates` is `None` the position is taken from `location`
    /// (see [`resolve_position`] for the timeout and fallback rules).
    /// Every result's address components are scanned for a postal code;
    /// the first one that normalizes to five digits wins.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request fails or the service
    /// answers with a non-success status.
    pub async fn zip_for_coordinates(
        &self,
        coordinates: Option<LatLng>,
        location: &dyn LocationProvider,
    ) -> Result<Option<ZipCode>, GeocodeError> {
        let position = match coordinates {
            Some(position) => position,
            None => resolve_position(location).await,
        };

        let latlng = format!("{},{}", position.lat, position.lng);
        let Some(response) = self.request(&[("latlng", latlng.as_str())]).await? else {
            return Ok(None);
        };

        let zip = first_postal_code(&response);
        match &zip {
            Some(zip) => log::info!("Resolved ({latlng}) to ZIP {zip}"),
            None => log::info!("No ZIP code found for ({latlng})"),
        }

        Ok(zip)
    }

    /// Looks up the distinct city names covering a ZIP code.
    ///
    /// Returns `None` rather than an empty list when no locality is found.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request fails or the service
    /// answers with a non-success status.
    pub async fn cities_for_zip(&self, zip: &ZipCode) -> Result<Option<Vec<String>>, GeocodeError> {
        let Some(response) = self.request(&[("address", zip.as_str())]).await? else {
            return Ok(None);
        };

        let cities = unique_localities(&response);
        log::debug!("ZIP {zip} cities: {cities:?}");

        Ok(if cities.is_empty() { None } else { Some(cities) })
    }

    /// Sends a geocode request, returning `None` when the service reports
    /// no usable results.
    async fn request(&self, params: &[(&str, &str)]) -> Result<Option<GeocodeResponse>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("Geocoding request failed with {status}");
            return Err(GeocodeError::Status { status });
        }

        let body = resp.text().await?;
        let response: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Parse {
                message: format!("Invalid geocoding response: {e}"),
            })?;

        if response.status != "OK" || response.results.is_empty() {
            match &response.error_message {
                Some(message) => log::warn!("Geocoding returned {}: {message}", response.status),
                None => log::debug!("Geocoding returned {}", response.status),
            }
            return Ok(None);
        }

        Ok(Some(response))
    }
}

/// Finds the first valid five-digit postal code across all results.
fn first_postal_code(response: &GeocodeResponse) -> Option<ZipCode> {
    response
        .results
        .iter()
        .flat_map(|r| &r.address_components)
        .filter(|c| c.has_type("postal_code"))
        .find_map(|c| ZipCode::from_postal_code(&c.long_name))
}

/// Collects the first locality of each result, deduplicated in
/// first-seen order.
fn unique_localities(response: &GeocodeResponse) -> Vec<String> {
    let mut cities: Vec<String> = Vec::new();

    for result in &response.results {
        let locality = result
            .address_components
            .iter()
            .find(|c| c.has_type("locality"));

        if let Some(component) = locality
            && !cities.contains(&component.long_name)
        {
            cities.push(component.long_name.clone());
        }
    }

    cities
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::location::{DEFAULT_POSITION, UnavailableLocation};

    fn geocoder(server: &MockServer) -> GoogleGeocoder {
        GoogleGeocoder::new(reqwest::Client::new(), server.uri(), "test-key".to_string())
    }

    fn component(name: &str, kind: &str) -> serde_json::Value {
        serde_json::json!({ "long_name": name, "short_name": name, "types": [kind, "political"] })
    }

    #[tokio::test]
    async fn reverse_geocode_normalizes_zip_plus_four() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("latlng", "41.88,-87.63"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [
                    { "address_components": [component("Chicago", "locality")] },
                    { "address_components": [component("ABCDE", "postal_code")] },
                    { "address_components": [component("60602-1234", "postal_code")] },
                    { "address_components": [component("60603", "postal_code")] }
                ]
            })))
            .mount(&server)
            .await;

        let zip = geocoder(&server)
            .zip_for_coordinates(Some(LatLng::new(41.88, -87.63)), &UnavailableLocation)
            .await
            .unwrap();

        assert_eq!(zip.map(String::from), Some("60602".to_string()));
    }

    #[tokio::test]
    async fn reverse_geocode_without_coordinates_uses_default_position() {
        let server = MockServer::start().await;
        let latlng = format!("{},{}", DEFAULT_POSITION.lat, DEFAULT_POSITION.lng);

        Mock::given(method("GET"))
            .and(query_param("latlng", latlng.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [{ "address_components": [component("94043", "postal_code")] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zip = geocoder(&server)
            .zip_for_coordinates(None, &UnavailableLocation)
            .await
            .unwrap();

        assert_eq!(zip.map(String::from), Some("94043".to_string()));
    }

    #[tokio::test]
    async fn zero_results_is_none_not_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ZERO_RESULTS",
                "results": []
            })))
            .mount(&server)
            .await;

        let geocoder = geocoder(&server);
        let zip = geocoder
            .zip_for_coordinates(Some(LatLng::new(0.0, 0.0)), &UnavailableLocation)
            .await
            .unwrap();
        assert!(zip.is_none());

        let cities = geocoder
            .cities_for_zip(&ZipCode::parse("00000").unwrap())
            .await
            .unwrap();
        assert!(cities.is_none());
    }

    #[tokio::test]
    async fn denied_request_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "results": []
            })))
            .mount(&server)
            .await;

        let cities = geocoder(&server)
            .cities_for_zip(&ZipCode::parse("94043").unwrap())
            .await
            .unwrap();
        assert!(cities.is_none());
    }

    #[tokio::test]
    async fn forward_geocode_deduplicates_localities() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("address", "94043"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [
                    { "address_components": [component("Mountain View", "locality"), component("94043", "postal_code")] },
                    { "address_components": [component("Santa Clara County", "administrative_area_level_2")] },
                    { "address_components": [component("Sunnyvale", "locality")] },
                    { "address_components": [component("Mountain View", "locality")] }
                ]
            })))
            .mount(&server)
            .await;

        let cities = geocoder(&server)
            .cities_for_zip(&ZipCode::parse("94043").unwrap())
            .await
            .unwrap();

        assert_eq!(
            cities,
            Some(vec!["Mountain View".to_string(), "Sunnyvale".to_string()])
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = geocoder(&server)
            .cities_for_zip(&ZipCode::parse("94043").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Google Geocoding API error: 403 Forbidden");
    }
}
