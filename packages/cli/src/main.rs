#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the ZIP code explorer.
//!
//! Each subcommand drives a [`zip_map_session::Controller`] through one
//! action and prints the resulting view. Running with no subcommand starts
//! a `dialoguer` menu that keeps one controller alive across actions.
//!
//! Uses `indicatif-log-bridge` (via [`zip_map_cli_utils::init_logger`])
//! so log lines and spinners never fight for the terminal.

mod actions;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zip_map_census_models::{LatLng, ZipCode};
use zip_map_session::{Controller, ViewState};

#[derive(Parser)]
#[command(name = "zip_map", about = "ZIP code demographics explorer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up demographics, boundary, and places for a ZIP code
    Search {
        /// Five-digit ZIP code
        zip: String,
        /// Also fetch the AI profile and doppelgangers
        #[arg(long)]
        insights: bool,
        /// Print the view state as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Write the GeoJSON map overlay to this file
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Search the ZIP code at a position (defaults to the current location)
    Locate {
        /// Latitude in degrees
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Print the view state as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Draw a second ZIP code's boundary next to the first
    Compare {
        /// Primary ZIP code
        zip: String,
        /// ZIP code to compare with
        other: String,
        /// Write the GeoJSON map overlay to this file
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Fetch the AI profile and doppelgangers for a ZIP code (Ctrl-C cancels)
    Insights {
        /// Five-digit ZIP code
        zip: String,
    },
    /// Print a ZIP code's boundary as a GeoJSON overlay
    Boundary {
        /// Five-digit ZIP code
        zip: String,
    },
    /// List the data sources and services behind the explorer
    Sources,
}

/// Fails with the search error, if the search pipeline failed.
fn check_search(state: &ViewState) -> Result<(), Box<dyn std::error::Error>> {
    state
        .search
        .error()
        .map_or(Ok(()), |message| Err(message.into()))
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = zip_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Search {
            zip,
            insights,
            json,
            overlay,
        } => {
            let mut controller = Controller::new(actions::build_services()?);
            actions::search(&mut controller, &multi, &zip).await;
            check_search(controller.state())?;

            if insights {
                actions::insights(&mut controller, &multi).await;
            }
            if let Some(path) = overlay {
                actions::write_overlay(controller.state(), &path)?;
            }
            actions::print_view(controller.state(), json)?;
        }
        Commands::Locate { lat, lng, json } => {
            let coordinates = lat.zip(lng).map(|(lat, lng)| LatLng::new(lat, lng));
            let mut controller = Controller::new(actions::build_services()?);
            actions::locate(&mut controller, &multi, coordinates).await;
            check_search(controller.state())?;

            actions::print_view(controller.state(), json)?;
        }
        Commands::Compare { zip, other, overlay } => {
            let mut controller = Controller::new(actions::build_services()?);
            actions::search(&mut controller, &multi, &zip).await;
            check_search(controller.state())?;

            actions::show_on_map(&mut controller, &multi, &other).await;
            if let Some(message) = controller.state().comparison_status.error() {
                return Err(message.into());
            }

            if let Some(path) = overlay {
                actions::write_overlay(controller.state(), &path)?;
            }
            actions::print_view(controller.state(), false)?;
        }
        Commands::Insights { zip } => {
            let mut controller = Controller::new(actions::build_services()?);
            actions::search(&mut controller, &multi, &zip).await;
            check_search(controller.state())?;

            actions::insights(&mut controller, &multi).await;
            let state = controller.state();
            if let Some(message) = state.insights_status.error() {
                return Err(message.into());
            }
            match &state.insights {
                Some(insights) => {
                    println!("{}", zip_map_render::cards::profile_card(&insights.profile));
                    println!(
                        "{}",
                        zip_map_render::cards::doppelganger_card(&insights.doppelgangers)
                    );
                }
                None => println!("Insight request cancelled."),
            }
        }
        Commands::Boundary { zip } => {
            let zip = ZipCode::parse(&zip)?;
            let services = actions::build_services()?;
            let boundary = services.boundaries.fetch_boundary(&zip).await?;

            let state = ViewState {
                zip_code: Some(zip),
                boundary: Some(boundary),
                ..ViewState::default()
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&zip_map_render::map_overlay(&state))?
            );
        }
        Commands::Sources => {
            let sources = zip_map_config::data_sources()?;
            println!("{}", zip_map_render::cards::data_sources_card(&sources));
        }
    }

    Ok(())
}
