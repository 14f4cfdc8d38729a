//! Steps shared by the subcommands and the interactive menu.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use zip_map_census_models::LatLng;
use zip_map_cli_utils::{MultiProgress, slow_spinner, spinner};
use zip_map_config::Config;
use zip_map_geocoder::location::EnvLocation;
use zip_map_render::facts::{FACT_INTERVAL, LOADING_HEADLINE, fact_after};
use zip_map_render::map_overlay;
use zip_map_session::{Controller, Services, ViewState};

/// Loads configuration and wires up the real services.
///
/// # Errors
///
/// Returns an error if the configuration can't be loaded or the HTTP
/// client can't be built.
pub fn build_services() -> Result<Services, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    log::debug!("Using endpoints {:?}", config.endpoints);

    Ok(Services::from_config(&config, Arc::new(EnvLocation))?)
}

/// Exit status of a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Resolves to `work`'s output, or `None` if `interrupt` completes first.
async fn race_interrupt<T>(work: impl Future<Output = T>, interrupt: impl Future) -> Option<T> {
    tokio::select! {
        biased;
        output = work => Some(output),
        _ = interrupt => None,
    }
}

/// Awaits `work`, exiting with the SIGINT status if Ctrl-C arrives first.
///
/// Once [`insights`] has listened for Ctrl-C the default SIGINT handler is
/// gone for the rest of the process, so every other wait goes through here.
async fn interruptible<T>(multi: &MultiProgress, work: impl Future<Output = T>) -> T {
    match race_interrupt(work, tokio::signal::ctrl_c()).await {
        Some(output) => output,
        None => {
            let _ = multi.clear();
            log::info!("Interrupted");
            std::process::exit(INTERRUPTED_EXIT_CODE)
        }
    }
}

/// Runs a search and waits for the places follow-up.
pub async fn search(controller: &mut Controller, multi: &MultiProgress, zip: &str) {
    let bar = spinner(multi, &format!("Loading ZIP {zip}..."));
    interruptible(multi, controller.search(zip)).await;
    bar.finish_and_clear();

    wait_for_places(controller, multi).await;
}

/// Resolves a position (or the current one) and waits for places.
pub async fn locate(
    controller: &mut Controller,
    multi: &MultiProgress,
    coordinates: Option<LatLng>,
) {
    let bar = spinner(multi, "Finding your ZIP code...");
    interruptible(multi, controller.locate(coordinates)).await;
    bar.finish_and_clear();

    wait_for_places(controller, multi).await;
}

/// Fetches a comparison boundary for `zip`.
pub async fn show_on_map(controller: &mut Controller, multi: &MultiProgress, zip: &str) {
    let bar = spinner(multi, &format!("Loading boundary for {zip}..."));
    interruptible(multi, controller.show_on_map(zip)).await;
    bar.finish_and_clear();
}

async fn wait_for_places(controller: &mut Controller, multi: &MultiProgress) {
    if !controller.state().places_status.is_loading() {
        return;
    }

    let bar = spinner(multi, "Finding places...");
    interruptible(multi, async {
        while controller.state().places_status.is_loading() {
            if controller.next_event().await.is_none() {
                break;
            }
        }
    })
    .await;
    bar.finish_and_clear();
}

/// Requests AI insights and waits for them, rotating trivia on the
/// spinner. Ctrl-C cancels the request.
pub async fn insights(controller: &mut Controller, multi: &MultiProgress) {
    controller.request_insights();
    if !controller.state().insights_status.is_loading() {
        return;
    }

    let started = Instant::now();
    let bar = slow_spinner(
        multi,
        &format!("{LOADING_HEADLINE} {}", fact_after(started.elapsed())),
    );
    let mut ticker = tokio::time::interval(FACT_INTERVAL);
    ticker.tick().await;

    while controller.state().insights_status.is_loading() {
        tokio::select! {
            event = controller.next_event() => {
                if event.is_none() {
                    break;
                }
            }
            _ = ticker.tick() => {
                bar.set_message(format!(
                    "{LOADING_HEADLINE} {}",
                    fact_after(started.elapsed())
                ));
            }
            _ = tokio::signal::ctrl_c() => {
                controller.cancel_insights();
                log::info!("Insight request cancelled");
            }
        }
    }

    bar.finish_and_clear();
}

/// Writes the state's GeoJSON overlay to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_overlay(state: &ViewState, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let overlay = map_overlay(state);
    std::fs::write(path, serde_json::to_string_pretty(&overlay)?)?;

    log::info!(
        "Wrote {} features to {}",
        overlay.features.len(),
        path.display()
    );

    Ok(())
}

/// Prints the state as text cards, or as JSON when `json` is set.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_view(state: &ViewState, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        println!("{}", zip_map_render::view_cards(state));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::future::{pending, ready};

    use super::*;

    #[tokio::test]
    async fn finished_work_wins_the_race() {
        assert_eq!(race_interrupt(ready(7), pending::<()>()).await, Some(7));
    }

    #[tokio::test]
    async fn interrupt_abandons_pending_work() {
        assert_eq!(race_interrupt(pending::<u8>(), ready(())).await, None);
    }
}
