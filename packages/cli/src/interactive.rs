//! Menu-driven explorer.
//!
//! Keeps one [`Controller`] alive so each action builds on the last: search
//! a ZIP, ask for insights, then put a doppelganger on the map next to it.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use zip_map_census_models::LatLng;
use zip_map_cli_utils::{MultiProgress, prompt_optional};
use zip_map_render::cards;
use zip_map_session::Controller;

use crate::actions;

const WELCOME_TITLE: &str = "Welcome to Demographic Doppelgänger";
const WELCOME_TAGLINE: &str =
    "Your journey to uncovering surprising community connections starts here.";

enum Action {
    Search,
    UseMyLocation,
    Insights,
    ShowOnMap,
    SelectPlace,
    ToggleTheme,
    ExportOverlay,
    DataSources,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Search,
        Self::UseMyLocation,
        Self::Insights,
        Self::ShowOnMap,
        Self::SelectPlace,
        Self::ToggleTheme,
        Self::ExportOverlay,
        Self::DataSources,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Search => "Search a ZIP code",
            Self::UseMyLocation => "Use my location",
            Self::Insights => "Get AI insights (Ctrl-C cancels)",
            Self::ShowOnMap => "Show a doppelgänger on the map",
            Self::SelectPlace => "Select a place",
            Self::ToggleTheme => "Toggle theme",
            Self::ExportOverlay => "Export map overlay",
            Self::DataSources => "Data sources",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu loop until the user quits.
///
/// # Errors
///
/// Returns an error if configuration can't be loaded or a prompt fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = Controller::new(actions::build_services()?);

    if controller.state().chrome.welcome_open {
        println!("{WELCOME_TITLE}");
        println!("{WELCOME_TAGLINE}");
        println!();
    }

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;
        controller.dismiss_welcome();

        match Action::ALL[idx] {
            Action::Search => {
                let zip: String = Input::new().with_prompt("ZIP code").interact_text()?;
                actions::search(&mut controller, multi, zip.trim()).await;
                controller.set_panel_open(controller.state().zip_code.is_some());
                actions::print_view(controller.state(), false)?;
            }
            Action::UseMyLocation => {
                let lat: Option<f64> = prompt_optional("Latitude (empty for current location)")?;
                let lng: Option<f64> = match lat {
                    Some(_) => prompt_optional("Longitude")?,
                    None => None,
                };
                let coordinates = lat.zip(lng).map(|(lat, lng)| LatLng::new(lat, lng));

                actions::locate(&mut controller, multi, coordinates).await;
                controller.set_panel_open(controller.state().zip_code.is_some());
                actions::print_view(controller.state(), false)?;
            }
            Action::Insights => {
                if controller.state().zip_code.is_none() {
                    println!("Search for a ZIP code first.");
                    continue;
                }
                actions::insights(&mut controller, multi).await;
                actions::print_view(controller.state(), false)?;
            }
            Action::ShowOnMap => show_on_map(&mut controller, multi).await?,
            Action::SelectPlace => select_place(&mut controller)?,
            Action::ToggleTheme => {
                let theme = controller.toggle_theme();
                println!("Theme: {theme}");
            }
            Action::ExportOverlay => {
                let path: String = Input::new()
                    .with_prompt("Output file")
                    .default("overlay.geojson".to_string())
                    .interact_text()?;
                actions::write_overlay(controller.state(), &PathBuf::from(path))?;
            }
            Action::DataSources => {
                controller.show_about();
                println!("{}", cards::data_sources_card(&zip_map_config::data_sources()?));
                controller.hide_about();
            }
            Action::Quit => break,
        }

        controller.drain_events();
    }

    Ok(())
}

/// Picks one of the current doppelgangers and draws it next to the
/// primary ZIP code.
async fn show_on_map(
    controller: &mut Controller,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let candidates: Vec<(String, String)> = controller
        .state()
        .insights
        .iter()
        .flat_map(|insights| &insights.doppelgangers)
        .map(|d| {
            (
                d.zip_code.clone(),
                format!("{} · {}, {}", d.zip_code, d.city, d.state),
            )
        })
        .collect();

    if candidates.is_empty() {
        println!("Get AI insights first to find doppelgänger ZIP codes.");
        return Ok(());
    }

    let labels: Vec<&str> = candidates.iter().map(|(_, label)| label.as_str()).collect();
    let idx = Select::new()
        .with_prompt("Which ZIP code?")
        .items(&labels)
        .default(0)
        .interact()?;

    let zip = &candidates[idx].0;
    actions::show_on_map(controller, multi, zip).await;

    let state = controller.state();
    match state.comparison_status.error() {
        Some(message) => println!("! {message}"),
        None => {
            let primary = state.zip_code.as_ref().map_or("", |z| z.as_str());
            println!("Showing {zip} next to {primary}.");
        }
    }

    Ok(())
}

/// Picks one of the loaded places and prints its details.
fn select_place(controller: &mut Controller) -> Result<(), Box<dyn std::error::Error>> {
    let places = controller.state().places.clone().unwrap_or_default();
    if places.is_empty() {
        println!("No places loaded.");
        return Ok(());
    }

    let labels: Vec<&str> = places.iter().map(|p| p.name()).collect();
    let idx = Select::new()
        .with_prompt("Which place?")
        .items(&labels)
        .default(0)
        .interact()?;

    let place = &places[idx];
    if controller.select_place(&place.id) {
        println!("{}", place.name());
        println!("{}", place.formatted_address);
        println!("{}", cards::google_maps_link(place));
    }

    Ok(())
}
