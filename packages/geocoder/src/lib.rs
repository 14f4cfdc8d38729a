#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding helpers for ZIP code lookups.
//!
//! Two independent operations against the Google Geocoding API:
//!
//! 1. **Coordinates to ZIP**: reverse-geocodes a position (the caller's,
//!    via a [`location::LocationProvider`], when none is given) and picks
//!    the first valid five-digit postal code.
//! 2. **ZIP to cities**: forward-geocodes a ZIP code and collects the
//!    distinct locality names across all results.
//!
//! A service-level "no results" answer is `Ok(None)`, never an error.
//! Only transport failures and non-success HTTP statuses are errors.

pub mod google;
pub mod location;

use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The geocoding service answered with a non-success status.
    #[error("Google Geocoding API error: {status}")]
    Status {
        /// The HTTP status returned.
        status: reqwest::StatusCode,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}
