#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! ZIP code, boundary, and demographic value types.
//!
//! These are the types shared by every stage of a ZIP code lookup: the
//! validated [`ZipCode`] a search starts from, the [`Boundary`] rings drawn
//! on the map, and the [`Demographics`] record built from ACS estimates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of total population assumed to be 65 or older.
///
/// This is a placeholder estimate, not an ACS figure. The age breakdown in
/// [`AgeBreakdown::approximate`] derives both the 65+ and 18-64 brackets
/// from it, so neither bracket is authoritative.
pub const AGE_65_PLUS_ESTIMATED_SHARE: f64 = 0.15;

/// Returned when a string is not exactly five ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please enter a valid 5-digit ZIP code.")]
pub struct InvalidZipCode {
    /// The rejected input.
    pub input: String,
}

/// A five-digit U.S. ZIP code (also used as the ZCTA code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Parses a ZIP code, accepting only strings matching `^\d{5}$`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidZipCode`] for anything else, including ZIP+4 input
    /// and surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, InvalidZipCode> {
        if input.len() == 5 && input.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(input.to_string()))
        } else {
            Err(InvalidZipCode {
                input: input.to_string(),
            })
        }
    }

    /// Normalizes a postal code as returned by geocoders.
    ///
    /// ZIP+4 values (`"94043-1351"`) are cut to their five-digit prefix.
    /// Returns `None` if the prefix still isn't a valid ZIP code.
    #[must_use]
    pub fn from_postal_code(postal_code: &str) -> Option<Self> {
        let prefix = postal_code.split('-').next().unwrap_or_default().trim();
        Self::parse(prefix).ok()
    }

    /// Returns the ZIP code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ZipCode {
    type Err = InvalidZipCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = InvalidZipCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(value: ZipCode) -> Self {
        value.0
    }
}

impl AsRef<str> for ZipCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A WGS84 coordinate in latitude/longitude order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One closed ring of a polygon, in source order.
pub type Ring = Vec<LatLng>;

/// The geographic outline of a ZIP code tabulation area.
///
/// Holds every ring of every part of the source polygon, flattened into a
/// single list. Ring order and point order are preserved from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Boundary {
    rings: Vec<Ring>,
}

impl Boundary {
    /// Creates a boundary from rings.
    #[must_use]
    pub const fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// The rings of this boundary.
    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// True when there is nothing to search inside: no rings at all, or a
    /// first ring with no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.first().is_none_or(Vec::is_empty)
    }

    /// Iterates every point of every ring.
    pub fn points(&self) -> impl Iterator<Item = &LatLng> {
        self.rings.iter().flatten()
    }
}

impl From<Vec<Ring>> for Boundary {
    fn from(rings: Vec<Ring>) -> Self {
        Self::new(rings)
    }
}

/// Age brackets derived from total population and the under-18 count.
///
/// Only `under_18` comes from ACS. `age_65_plus` is estimated as
/// [`AGE_65_PLUS_ESTIMATED_SHARE`] of the population and `age_18_to_64`
/// is the remainder, so the three brackets sum to the population unless the
/// remainder had to be clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBreakdown {
    /// Residents under 18 (ACS `B09001_001E`).
    pub under_18: u64,
    /// Residents 18 to 64 (remainder, clamped at zero).
    #[serde(rename = "age18to64")]
    pub age_18_to_64: u64,
    /// Residents 65 and older (estimated).
    #[serde(rename = "age65plus")]
    pub age_65_plus: u64,
}

impl AgeBreakdown {
    /// Derives the breakdown from total population and the under-18 count.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn approximate(population: u64, under_18: u64) -> Self {
        let age_65_plus = (population as f64 * AGE_65_PLUS_ESTIMATED_SHARE).round() as u64;
        let age_18_to_64 = population.saturating_sub(under_18).saturating_sub(age_65_plus);

        Self {
            under_18,
            age_18_to_64,
            age_65_plus,
        }
    }
}

/// ACS 5-year statistics for one ZIP code tabulation area.
///
/// Counts are never negative: missing or negative raw values become zero.
/// Medians are `None` when ACS suppresses them (it reports large negative
/// sentinel values such as `-666666666` in that case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    /// ACS area name (e.g. "ZCTA5 94043").
    pub name: String,
    /// The ZIP code tabulation area this record describes.
    pub zip_code: String,
    /// Total population.
    pub population: u64,
    /// Median age in years.
    pub median_age: Option<f64>,
    /// Median household income in dollars.
    pub median_income: Option<u64>,
    /// Median owner-occupied home value in dollars.
    pub median_home_value: Option<u64>,
    /// Median gross rent in dollars.
    pub median_rent: Option<u64>,
    /// White alone.
    pub race_white: u64,
    /// Black or African American alone.
    pub race_black: u64,
    /// American Indian and Alaska Native alone.
    pub race_native: u64,
    /// Asian alone.
    pub race_asian: u64,
    /// Population 25 years and over.
    pub education_population: u64,
    /// Bachelor's degree holders (25+).
    pub education_bachelors: u64,
    /// Master's degree holders (25+).
    pub education_graduate: u64,
    /// Total housing units.
    pub housing_units: u64,
    /// Owner-occupied units.
    pub owner_occupied: u64,
    /// Renter-occupied units.
    pub renter_occupied: u64,
    /// Workers 16 and over.
    pub commute_total: u64,
    /// Commute by car, truck, or van.
    pub commute_drive: u64,
    /// Commute by public transportation.
    pub commute_public: u64,
    /// Worked from home.
    pub commute_wfh: u64,
    /// Derived age brackets.
    pub ages: AgeBreakdown,
}
