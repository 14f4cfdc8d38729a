//! Upstream service seams.
//!
//! Each trait covers one capability the controller needs. The concrete
//! clients from the other crates implement them, and [`Services`] bundles
//! one of each.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use zip_map_ai::GatewayResponse;
use zip_map_ai::gateway::InsightClient;
use zip_map_census_models::{Boundary, Demographics, LatLng, ZipCode};
use zip_map_config::Config;
use zip_map_geocoder::google::GoogleGeocoder;
use zip_map_geocoder::location::LocationProvider;
use zip_map_places::{PlacesClient, PlacesOutcome};
use zip_map_spatial::{GeoPolygonTester, PointInPolygonTester};

use crate::SessionError;

/// ACS demographics for a ZIP code.
#[async_trait::async_trait]
pub trait DemographicsSource: Send + Sync {
    /// Fetches demographics for `zip`.
    async fn fetch_demographics(&self, zip: &ZipCode) -> Result<Demographics, SessionError>;
}

/// ZCTA boundary polygons.
#[async_trait::async_trait]
pub trait BoundarySource: Send + Sync {
    /// Fetches the boundary of `zip`.
    async fn fetch_boundary(&self, zip: &ZipCode) -> Result<Boundary, SessionError>;
}

/// City names covering a ZIP code.
#[async_trait::async_trait]
pub trait CitySource: Send + Sync {
    /// Looks up the cities for `zip`, or `None` if there are none.
    async fn cities_for_zip(&self, zip: &ZipCode) -> Result<Option<Vec<String>>, SessionError>;
}

/// Resolves a position to a ZIP code.
#[async_trait::async_trait]
pub trait ZipLocator: Send + Sync {
    /// Resolves `coordinates`, or the current position when `None`.
    async fn locate_zip(&self, coordinates: Option<LatLng>) -> Result<Option<ZipCode>, SessionError>;
}

/// Points of interest inside a boundary.
#[async_trait::async_trait]
pub trait PlaceSource: Send + Sync {
    /// Searches for places inside `boundary`, filtering with `tester` when
    /// one is given.
    async fn search_within(
        &self,
        boundary: &Boundary,
        zip: &ZipCode,
        tester: Option<&dyn PointInPolygonTester>,
    ) -> Result<PlacesOutcome, SessionError>;
}

/// AI profile and doppelgangers.
#[async_trait::async_trait]
pub trait InsightSource: Send + Sync {
    /// Requests insights for `zip`, giving up when `cancel` fires.
    async fn fetch_insights(
        &self,
        zip: &ZipCode,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, SessionError>;
}

/// Census Bureau client bound to its two endpoints.
#[derive(Debug, Clone)]
pub struct CensusClient {
    client: reqwest::Client,
    acs_url: String,
    tigerweb_url: String,
}

impl CensusClient {
    /// Creates a Census client.
    #[must_use]
    pub const fn new(client: reqwest::Client, acs_url: String, tigerweb_url: String) -> Self {
        Self {
            client,
            acs_url,
            tigerweb_url,
        }
    }
}

#[async_trait::async_trait]
impl DemographicsSource for CensusClient {
    async fn fetch_demographics(&self, zip: &ZipCode) -> Result<Demographics, SessionError> {
        Ok(zip_map_census::acs::fetch_demographics(&self.client, &self.acs_url, zip).await?)
    }
}

#[async_trait::async_trait]
impl BoundarySource for CensusClient {
    async fn fetch_boundary(&self, zip: &ZipCode) -> Result<Boundary, SessionError> {
        Ok(zip_map_census::tigerweb::fetch_boundary(&self.client, &self.tigerweb_url, zip).await?)
    }
}

#[async_trait::async_trait]
impl CitySource for GoogleGeocoder {
    async fn cities_for_zip(&self, zip: &ZipCode) -> Result<Option<Vec<String>>, SessionError> {
        Ok(Self::cities_for_zip(self, zip).await?)
    }
}

/// Reverse geocoder paired with the position source used when no
/// coordinates are given.
pub struct GeocodingLocator {
    geocoder: GoogleGeocoder,
    location: Arc<dyn LocationProvider>,
}

impl GeocodingLocator {
    /// Creates a locator.
    #[must_use]
    pub fn new(geocoder: GoogleGeocoder, location: Arc<dyn LocationProvider>) -> Self {
        Self { geocoder, location }
    }
}

#[async_trait::async_trait]
impl ZipLocator for GeocodingLocator {
    async fn locate_zip(&self, coordinates: Option<LatLng>) -> Result<Option<ZipCode>, SessionError> {
        Ok(self
            .geocoder
            .zip_for_coordinates(coordinates, self.location.as_ref())
            .await?)
    }
}

#[async_trait::async_trait]
impl PlaceSource for PlacesClient {
    async fn search_within(
        &self,
        boundary: &Boundary,
        zip: &ZipCode,
        tester: Option<&dyn PointInPolygonTester>,
    ) -> Result<PlacesOutcome, SessionError> {
        Ok(Self::search_within(self, boundary, zip, tester).await?)
    }
}

#[async_trait::async_trait]
impl InsightSource for InsightClient {
    async fn fetch_insights(
        &self,
        zip: &ZipCode,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, SessionError> {
        Ok(Self::fetch_insights(self, zip, cancel).await?)
    }
}

/// One implementation of every service the controller uses.
#[derive(Clone)]
pub struct Services {
    /// ACS demographics.
    pub demographics: Arc<dyn DemographicsSource>,
    /// ZCTA boundaries.
    pub boundaries: Arc<dyn BoundarySource>,
    /// City names.
    pub cities: Arc<dyn CitySource>,
    /// Position to ZIP.
    pub locator: Arc<dyn ZipLocator>,
    /// Points of interest.
    pub places: Arc<dyn PlaceSource>,
    /// AI insights.
    pub insights: Arc<dyn InsightSource>,
    /// Polygon filter for places. `None` degrades places to bounding-box
    /// precision.
    pub tester: Option<Arc<dyn PointInPolygonTester>>,
}

impl Services {
    /// Wires up the real clients from `config`.
    ///
    /// All clients share one connection pool. `location` supplies the
    /// current position for "use my location".
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the HTTP client can't be built.
    pub fn from_config(
        config: &Config,
        location: Arc<dyn LocationProvider>,
    ) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("zip_map/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoints = &config.endpoints;
        let credentials = &config.credentials;

        let census = Arc::new(CensusClient::new(
            client.clone(),
            endpoints.acs.clone(),
            endpoints.tigerweb.clone(),
        ));
        let geocoder = GoogleGeocoder::new(
            client.clone(),
            endpoints.geocode.clone(),
            credentials.google_maps_api_key.clone(),
        );

        Ok(Self {
            demographics: census.clone(),
            boundaries: census,
            cities: Arc::new(geocoder.clone()),
            locator: Arc::new(GeocodingLocator::new(geocoder, location)),
            places: Arc::new(PlacesClient::new(
                client.clone(),
                endpoints.places.clone(),
                credentials.google_maps_api_key.clone(),
            )),
            insights: Arc::new(InsightClient::new(
                client,
                endpoints.gateway.clone(),
                credentials.gateway_api_key.clone(),
            )),
            tester: Some(Arc::new(GeoPolygonTester)),
        })
    }
}
