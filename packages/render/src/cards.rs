//! Plain-text cards describing a [`ViewState`].
//!
//! Each card is a titled block of lines. [`view_cards`] assembles the
//! cards appropriate for the current state, in display order.

use std::fmt::Write as _;

use zip_map_ai::{Doppelganger, Profile};
use zip_map_census_models::Demographics;
use zip_map_config::DataSource;
use zip_map_places::Place;
use zip_map_session::{PipelineStatus, ViewState};
use zip_map_spatial::PrecisionMode;

use crate::format::{
    NOT_AVAILABLE, format_number, format_optional_currency, format_percent, percentage,
};

const BAR_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 12;

/// Shown before any ZIP code has been loaded.
pub const EMPTY_MESSAGE: &str =
    "Search for a ZIP code or use your location to view demographics data.";

fn title(out: &mut String, text: &str) {
    let _ = writeln!(out, "{text}");
    let _ = writeln!(out, "{}", "─".repeat(text.chars().count()));
}

/// Renders a labelled share bar: `White        600 (60.0%) ############--------`.
#[must_use]
pub fn data_bar(label: &str, value: u64, total: u64) -> String {
    let share = percentage(value, total);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((share / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;

    format!(
        "{label:<LABEL_WIDTH$} {} ({}) {}{}",
        format_number(value),
        format_percent(share),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
    )
}

/// ZIP code, cities, and headline figures.
#[must_use]
pub fn header_card(zip: &str, cities: Option<&[String]>, demographics: &Demographics) -> String {
    let mut out = String::new();
    title(&mut out, &format!("ZIP Code {zip}"));

    if let Some(cities) = cities.filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "{}", cities.join(" · "));
    }

    let age = demographics
        .median_age
        .map_or_else(|| NOT_AVAILABLE.to_string(), |a| format!("{a} yrs"));

    let _ = writeln!(out, "Population  {}", format_number(demographics.population));
    let _ = writeln!(out, "Age         {age}");
    let _ = writeln!(
        out,
        "Income      {}",
        format_optional_currency(demographics.median_income)
    );
    let _ = writeln!(
        out,
        "Home Value  {}",
        format_optional_currency(demographics.median_home_value)
    );

    out
}

/// Age, race, housing, education, and commute breakdowns.
#[must_use]
pub fn demographics_card(demographics: &Demographics) -> String {
    let d = demographics;
    let mut out = String::new();
    title(&mut out, "Detailed Demographics");
    let _ = writeln!(out, "Source: 2022 ACS 5-Year Estimates");

    let _ = writeln!(out, "\nPopulation");
    for (label, value) in [
        ("<18", d.ages.under_18),
        ("18-64", d.ages.age_18_to_64),
        ("65+", d.ages.age_65_plus),
        ("White", d.race_white),
        ("Black", d.race_black),
        ("Asian", d.race_asian),
    ] {
        let _ = writeln!(out, "  {}", data_bar(label, value, d.population));
    }
    let _ = writeln!(out, "  (65+ is estimated at a fixed share of the population)");

    let _ = writeln!(out, "\nHousing");
    let _ = writeln!(out, "  Housing Units {}", format_number(d.housing_units));
    let _ = writeln!(out, "  Median Rent   {}", format_optional_currency(d.median_rent));
    let _ = writeln!(out, "  {}", data_bar("Owner", d.owner_occupied, d.housing_units));
    let _ = writeln!(out, "  {}", data_bar("Renter", d.renter_occupied, d.housing_units));

    let _ = writeln!(out, "\nCommunity");
    for (label, value, total) in [
        ("Bachelor's", d.education_bachelors, d.education_population),
        ("Graduate", d.education_graduate, d.education_population),
        ("Drive", d.commute_drive, d.commute_total),
        ("Transit", d.commute_public, d.commute_total),
        ("WFH", d.commute_wfh, d.commute_total),
    ] {
        let _ = writeln!(out, "  {}", data_bar(label, value, total));
    }

    out
}

/// Link that opens a place in Google Maps.
///
/// Both query values are percent-encoded, so characters such as `+`, `&`,
/// and `=` in an address survive the round trip.
#[must_use]
pub fn google_maps_link(place: &Place) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}&query_place_id={}",
        urlencoding::encode(&place.formatted_address),
        urlencoding::encode(&place.id)
    )
}

/// Points of interest, or the state of their search.
#[must_use]
pub fn places_card(
    places: Option<&[Place]>,
    status: &PipelineStatus,
    precision: Option<PrecisionMode>,
) -> String {
    let mut out = String::new();
    title(&mut out, "Points of Interest");

    match status {
        PipelineStatus::Loading => {
            let _ = writeln!(out, "Finding places...");
            return out;
        }
        PipelineStatus::Failed(message) => {
            let _ = writeln!(out, "! {message}");
            return out;
        }
        PipelineStatus::Idle | PipelineStatus::Ready => {}
    }

    let Some(places) = places.filter(|p| !p.is_empty()) else {
        let _ = writeln!(out, "No notable points of interest were found for this area.");
        return out;
    };

    for (i, place) in places.iter().enumerate() {
        let rating = place
            .rating
            .map(|r| format!(" ★ {r:.1}"))
            .unwrap_or_default();
        let _ = writeln!(out, "{:>2}. {}{rating}", i + 1, place.name());
        if !place.formatted_address.is_empty() {
            let _ = writeln!(out, "    {}", place.formatted_address);
        }
    }

    if precision == Some(PrecisionMode::BoundingBoxOnly) {
        let _ = writeln!(
            out,
            "\nNote: results are limited to the area's bounding box and may include places just outside the ZIP code."
        );
    }

    out
}

/// The AI-generated profile.
#[must_use]
pub fn profile_card(profile: &Profile) -> String {
    let mut out = String::new();
    title(&mut out, "Market Profile");

    let _ = writeln!(out, "WHO ARE WE?\n{}", profile.who_are_we);

    for (heading, items) in [
        ("OUR NEIGHBORHOOD", &profile.our_neighborhood),
        ("SOCIOECONOMIC TRAITS", &profile.socioeconomic_traits),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}");
        for item in items {
            let _ = writeln!(out, "  • {item}");
        }
    }

    out
}

/// Similar ZIP codes.
#[must_use]
pub fn doppelganger_card(doppelgangers: &[Doppelganger]) -> String {
    let mut out = String::new();
    title(&mut out, "Doppelgänger Results");

    if doppelgangers.is_empty() {
        let _ = writeln!(out, "No similar ZIP codes found.");
        return out;
    }

    for d in doppelgangers {
        let _ = writeln!(
            out,
            "{} · {}, {} ({}% Match)",
            d.zip_code, d.city, d.state, d.similarity_percentage
        );
        let _ = writeln!(out, "    {}", d.similarity_reason);
    }

    out
}

/// The data source catalog, grouped by section.
#[must_use]
pub fn data_sources_card(sources: &[DataSource]) -> String {
    let mut out = String::new();
    title(&mut out, "About Our Data & Technology");

    let mut section: Option<&str> = None;
    for source in sources {
        if section != Some(source.section.as_str()) {
            let _ = writeln!(out, "\n{}", source.section.to_uppercase());
            section = Some(source.section.as_str());
        }
        let _ = writeln!(out, "• {}\n  {}", source.name, source.description);
    }

    out
}

/// Every card for the current state, in display order, separated by blank
/// lines.
#[must_use]
pub fn view_cards(state: &ViewState) -> String {
    let mut cards = Vec::new();

    if let Some(message) = state.search.error() {
        cards.push(format!("! {message}\n"));
    }

    let (Some(zip), Some(demographics)) = (&state.zip_code, &state.demographics) else {
        if state.search.is_loading() {
            cards.push("Loading...\n".to_string());
        } else {
            cards.push(format!("{EMPTY_MESSAGE}\n"));
        }
        return cards.join("\n");
    };

    cards.push(header_card(
        zip.as_str(),
        state.cities.as_deref(),
        demographics,
    ));
    cards.push(demographics_card(demographics));

    if let Some(message) = state.insights_status.error() {
        cards.push(format!("! {message}\n"));
    }
    match (&state.insights_status, &state.insights) {
        (PipelineStatus::Loading, _) => {
            cards.push("Generating AI insights... (Ctrl-C to cancel)\n".to_string());
        }
        (_, Some(insights)) => {
            cards.push(profile_card(&insights.profile));
            cards.push(doppelganger_card(&insights.doppelgangers));
        }
        (_, None) => {
            cards.push(
                "Get AI insights for this ZIP code to see its profile and doppelgängers.\n"
                    .to_string(),
            );
        }
    }

    if let Some(message) = state.comparison_status.error() {
        cards.push(format!("! {message}\n"));
    } else if let Some(comparison) = &state.comparison {
        cards.push(format!("Comparing with ZIP {}\n", comparison.zip_code));
    }

    cards.push(places_card(
        state.places.as_deref(),
        &state.places_status,
        state.places_precision,
    ));

    if let Some(place) = &state.selected_place {
        cards.push(format!(
            "Selected: {}\n{}\n{}\n",
            place.name(),
            place.formatted_address,
            google_maps_link(place)
        ));
    }

    cards.join("\n")
}
