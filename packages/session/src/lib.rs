#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View orchestration for ZIP code lookups.
//!
//! A [`Controller`] owns the [`ViewState`] and sequences the upstream calls
//! for each user action:
//!
//! - **search**: demographics, cities, and boundary concurrently, then a
//!   background places search once the boundary is known
//! - **locate**: reverse-geocode a position to a ZIP, then search
//! - **show on map**: fetch a comparison boundary alongside the primary one
//! - **insights**: an on-demand, cancellable AI request
//!
//! Background pipelines report back over a channel and the controller
//! applies their results, so all state changes happen in one place.
//! Upstream clients sit behind the traits in [`services`] so they can be
//! replaced in tests.

pub mod controller;
pub mod services;
pub mod state;

pub use controller::{Controller, Pipeline};
pub use services::Services;
pub use state::{Comparison, PipelineStatus, Theme, UiChrome, ViewState};

use thiserror::Error;

/// Errors surfaced by upstream services.
///
/// Every variant displays the underlying message unchanged, since these
/// strings end up in front of the user.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Census boundary or demographics lookup failed.
    #[error(transparent)]
    Census(#[from] zip_map_census::CensusError),

    /// Geocoding failed.
    #[error(transparent)]
    Geocode(#[from] zip_map_geocoder::GeocodeError),

    /// Places search failed.
    #[error(transparent)]
    Places(#[from] zip_map_places::PlacesError),

    /// Insight request failed or was cancelled.
    #[error(transparent)]
    Insight(#[from] zip_map_ai::InsightError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] zip_map_config::ConfigError),

    /// A background task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The shared HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SessionError {
    /// True if this error is a user cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Insight(e) if e.is_cancelled())
    }
}
