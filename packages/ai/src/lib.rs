#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! AI neighborhood insights for a ZIP code.
//!
//! The profile and "doppelganger" matches are produced by a backend service
//! behind an API gateway. This crate only calls it: one authenticated POST
//! per request, cancellable through a [`CancellationToken`] so a caller can
//! abandon a slow generation without waiting for it.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod gateway;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback message when the gateway reports a failure without one.
pub const DEFAULT_GATEWAY_ERROR: &str = "Failed to fetch data from API";

/// Errors that can occur while fetching insights.
#[derive(Debug, Error)]
pub enum InsightError {
    /// HTTP request to the gateway failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway answered with a non-success status.
    #[error("{message}")]
    Gateway {
        /// The HTTP status returned.
        status: reqwest::StatusCode,
        /// The backend's error message.
        message: String,
    },

    /// The request was cancelled before it completed.
    #[error("Insight request was cancelled")]
    Cancelled,
}

impl InsightError {
    /// True if this error is a user cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// AI-generated description of a ZIP code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// A short narrative of who lives here.
    pub who_are_we: String,
    /// Bullet points about the neighborhood.
    #[serde(default)]
    pub our_neighborhood: Vec<String>,
    /// Bullet points about socioeconomic traits.
    #[serde(default)]
    pub socioeconomic_traits: Vec<String>,
}

/// A demographically similar ZIP code elsewhere in the country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doppelganger {
    /// The similar ZIP code.
    pub zip_code: String,
    /// City the ZIP code belongs to.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Why the two areas are considered similar.
    pub similarity_reason: String,
    /// Similarity score, 0 to 100.
    pub similarity_percentage: f64,
}

/// The gateway's response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// The generated profile.
    pub profile: Profile,
    /// Similar ZIP codes, best match first.
    #[serde(default)]
    pub doppelgangers: Vec<Doppelganger>,
    /// Demographics echoed by the backend. Kept but not interpreted.
    #[serde(default)]
    pub demographics: Option<serde_json::Value>,
}

/// The part of a gateway response the application displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// The generated profile.
    pub profile: Profile,
    /// Similar ZIP codes, best match first.
    pub doppelgangers: Vec<Doppelganger>,
}

impl From<GatewayResponse> for Insights {
    fn from(response: GatewayResponse) -> Self {
        Self {
            profile: response.profile,
            doppelgangers: response.doppelgangers,
        }
    }
}
