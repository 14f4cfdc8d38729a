#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census Bureau clients for a single ZIP code.
//!
//! - [`tigerweb`] fetches the ZCTA boundary polygon from the `TIGERweb`
//!   `MapServer` as `GeoJSON` and reprojects it into lat/lng rings.
//! - [`acs`] fetches a fixed set of ACS 5-year variables and maps them into
//!   a typed [`Demographics`](zip_map_census_models::Demographics) record.
//!
//! Neither client retries. Every non-success response is terminal for the
//! lookup that issued it.

pub mod acs;
pub mod tigerweb;

use thiserror::Error;

/// Errors that can occur while fetching Census data.
#[derive(Debug, Error)]
pub enum CensusError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("{service} API error: {status}")]
    Status {
        /// Human-readable service name (e.g. "Census TIGERweb").
        service: &'static str,
        /// The HTTP status returned.
        status: reqwest::StatusCode,
    },

    /// The request succeeded but matched nothing.
    #[error("No {what} data found for ZIP code {zip}.")]
    NotFound {
        /// What was being looked up ("boundary", "demographic").
        what: &'static str,
        /// The ZIP code that was queried.
        zip: String,
    },

    /// The response had an unexpected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
