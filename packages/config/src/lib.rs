#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runtime configuration.
//!
//! Endpoint URLs and the data source catalog ship in `services.toml`,
//! embedded at compile time. Endpoints are resolved in this order, highest
//! precedence first:
//!
//! 1. the endpoint's environment variable (e.g. `ZIP_MAP_ACS_URL`)
//! 2. the `[endpoints]` table of the file named by `ZIP_MAP_CONFIG`
//! 3. the embedded defaults
//!
//! Credentials only come from the environment. A missing credential is
//! logged and left empty so the affected service rejects the call, rather
//! than failing at startup.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an endpoint override file.
pub const CONFIG_PATH_ENV: &str = "ZIP_MAP_CONFIG";
/// Google Maps Platform key (Geocoding and Places).
pub const GOOGLE_MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
/// API gateway key for the insight backend.
pub const GATEWAY_API_KEY_ENV: &str = "API_GATEWAY_KEY";

const EMBEDDED_SERVICES: &str = include_str!("../services.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// The file that was named.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A TOML document was malformed.
    #[error("Invalid config in {origin}: {source}")]
    Parse {
        /// Where the document came from.
        origin: String,
        /// The underlying parse error.
        source: toml::de::Error,
    },
}

/// Upstream service URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    /// ACS 5-year dataset URL.
    pub acs: String,
    /// `TIGERweb` ZCTA layer URL (ending in `/MapServer/<layer>`).
    pub tigerweb: String,
    /// Google Geocoding JSON endpoint.
    pub geocode: String,
    /// Google Places `searchText` endpoint.
    pub places: String,
    /// Insight gateway endpoint.
    pub gateway: String,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointOverrides {
    acs: Option<String>,
    tigerweb: Option<String>,
    geocode: Option<String>,
    places: Option<String>,
    gateway: Option<String>,
}

impl Endpoints {
    fn apply(&mut self, overrides: EndpointOverrides) {
        let slots = [
            (&mut self.acs, overrides.acs),
            (&mut self.tigerweb, overrides.tigerweb),
            (&mut self.geocode, overrides.geocode),
            (&mut self.places, overrides.places),
            (&mut self.gateway, overrides.gateway),
        ];

        for (slot, value) in slots {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }
    }

    fn env_overrides(lookup: &impl Fn(&str) -> Option<String>) -> EndpointOverrides {
        EndpointOverrides {
            acs: lookup("ZIP_MAP_ACS_URL"),
            tigerweb: lookup("ZIP_MAP_TIGERWEB_URL"),
            geocode: lookup("ZIP_MAP_GEOCODE_URL"),
            places: lookup("ZIP_MAP_PLACES_URL"),
            gateway: lookup("API_GATEWAY_URL"),
        }
    }
}

/// An entry in the data source catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSource {
    /// Grouping heading.
    pub section: String,
    /// Display name.
    pub name: String,
    /// What the source contributes.
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddedServices {
    endpoints: Endpoints,
    #[serde(default)]
    sources: Vec<DataSource>,
}

#[derive(Debug, Default, Deserialize)]
struct OverrideFile {
    #[serde(default)]
    endpoints: EndpointOverrides,
}

fn embedded() -> Result<EmbeddedServices, ConfigError> {
    toml::de::from_str(EMBEDDED_SERVICES).map_err(|source| ConfigError::Parse {
        origin: "embedded services.toml".to_string(),
        source,
    })
}

/// API keys for the authenticated services.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Google Maps Platform key.
    pub google_maps_api_key: String,
    /// Insight gateway key.
    pub gateway_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &str| if key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("google_maps_api_key", &redact(&self.google_maps_api_key))
            .field("gateway_api_key", &redact(&self.gateway_api_key))
            .finish()
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Service URLs.
    pub endpoints: Endpoints,
    /// Service credentials.
    pub credentials: Credentials,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `ZIP_MAP_CONFIG` names a file that can't be
    /// read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `ZIP_MAP_CONFIG` names a file that can't be
    /// read or parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut endpoints = embedded()?.endpoints;

        if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            let path = PathBuf::from(path);
            log::info!("Loading endpoint overrides from {}", path.display());

            let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let file: OverrideFile =
                toml::de::from_str(&contents).map_err(|source| ConfigError::Parse {
                    origin: path.display().to_string(),
                    source,
                })?;

            endpoints.apply(file.endpoints);
        }

        endpoints.apply(Endpoints::env_overrides(&lookup));

        let credentials = Credentials {
            google_maps_api_key: credential(&lookup, GOOGLE_MAPS_API_KEY_ENV),
            gateway_api_key: credential(&lookup, GATEWAY_API_KEY_ENV),
        };

        log::debug!("Resolved endpoints: {endpoints:?}");

        Ok(Self {
            endpoints,
            credentials,
        })
    }
}

fn credential(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> String {
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => {
            log::warn!("{name} is not set. Requests that need it will fail.");
            String::new()
        }
    }
}

/// The data source catalog, in display order.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the embedded catalog is malformed.
pub fn data_sources() -> Result<Vec<DataSource>, ConfigError> {
    Ok(embedded()?.sources)
}
